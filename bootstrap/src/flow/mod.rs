/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    File contains the bootstrap orchestrator walking the WPR header list and bringing each
    target into Light-Secure mode.

--*/

mod load;
mod target;

use lsboot_drivers::{
    cprintln, DescriptorResolver, EngineId, EngineKind, HexU32, IsolationProtocol, MmioMut,
    StatusReporter,
};
use lsboot_error::{BootResult, LsBootError};

use crate::boot_status::LsBootStatus;
use crate::config::BootConfig;
use crate::env::BootEnv;
use crate::header::FirmwareHeader;
use crate::outcome::{BootStage, BootstrapOutcome, OutcomeList, TargetOutcome, MAX_TARGETS};
use target::TargetFlow;

/// Bootstrap orchestrator
pub struct Bootstrap<'a, M: MmioMut> {
    env: BootEnv<'a, M>,
    config: BootConfig<'a>,
    reporter: StatusReporter<'a, M>,
}

impl<'a, M: MmioMut> Bootstrap<'a, M> {
    pub fn new(env: BootEnv<'a, M>, config: BootConfig<'a>) -> Self {
        let reporter = StatusReporter::new(env.mmio, env.chip.globals());
        Self {
            env,
            config,
            reporter,
        }
    }

    fn protocol(&self) -> BootResult<IsolationProtocol<'a, M>> {
        let source = self.config.source;
        let source_id = DescriptorResolver::new(self.env.chip).source_id(source)?;
        Ok(
            IsolationProtocol::new(self.env.mmio, self.env.chip, source, source_id)?
                .with_bypass(self.config.effective_isolation_bypass()),
        )
    }

    /// Bootstrap every target in the WPR header list, in list order.
    ///
    /// A failing target does not stop the pass. Its outcome records the stage it failed in and
    /// the next header is processed.
    ///
    /// # Returns
    ///
    /// * `OutcomeList` - One outcome per header
    pub fn bootstrap_all(&self) -> BootResult<OutcomeList> {
        let headers = self.env.wpr.headers();
        if headers.len() > MAX_TARGETS {
            return Err(LsBootError::BOOTSTRAP_TOO_MANY_TARGETS);
        }

        cprintln!("[lsboot] Bootstrap started, {} targets", headers.len());
        self.reporter
            .report_boot_status(LsBootStatus::BootstrapStarted.into());

        let mut protocol = self.protocol()?;
        let mut outcomes = OutcomeList::default();
        for header in headers {
            let outcome = self.run_target(&mut protocol, header);
            let entry = TargetOutcome {
                engine: EngineId::new(header.engine, header.instance),
                outcome,
            };
            if !outcomes.push(entry) {
                return Err(LsBootError::BOOTSTRAP_TOO_MANY_TARGETS);
            }
        }

        cprintln!(
            "[lsboot] Bootstrap complete, {} of {} authorized",
            outcomes.authorized_count(),
            outcomes.len()
        );
        self.reporter
            .report_boot_status(LsBootStatus::BootstrapComplete.into());

        Ok(outcomes)
    }

    /// Rerun the full sequence for one engine, for recovery after the engine crashed or was
    /// reset by another agent.
    pub fn reset_and_reauthorize(&self, kind: EngineKind) -> BootstrapOutcome {
        cprintln!("[lsboot] Recovering {}", kind);
        self.reporter
            .report_boot_status(LsBootStatus::RecoveryStarted.into());

        let Some(header) = self.env.wpr.find(kind) else {
            return BootstrapOutcome::FailedAt(
                BootStage::Resolve,
                LsBootError::BOOTSTRAP_HEADER_NOT_FOUND,
            );
        };

        match self.protocol() {
            Ok(mut protocol) => self.run_target(&mut protocol, header),
            Err(err) => BootstrapOutcome::FailedAt(BootStage::Lock, err),
        }
    }

    fn run_target(
        &self,
        protocol: &mut IsolationProtocol<'a, M>,
        header: &FirmwareHeader,
    ) -> BootstrapOutcome {
        let flow = TargetFlow::new(&self.env, &self.config, &self.reporter);
        match flow.run(protocol, header) {
            Ok(()) => BootstrapOutcome::Authorized,
            Err((stage, err)) => {
                if err.is_fatal() {
                    self.handle_fatal_error(err);
                }
                self.reporter.report_error_non_fatal(err.into());
                BootstrapOutcome::FailedAt(stage, err)
            }
        }
    }

    /// Report a fatal error and halt the source. The target's isolation has already been
    /// released.
    fn handle_fatal_error(&self, err: LsBootError) -> ! {
        let code = u32::from(err);
        cprintln!("[lsboot] Fatal error {}", HexU32(code));
        self.reporter.report_error_fatal(code);
        self.env.halt.halt(code)
    }
}
