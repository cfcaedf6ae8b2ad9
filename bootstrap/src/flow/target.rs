/*++

Licensed under the Apache-2.0 license.

File Name:

    target.rs

Abstract:

    File contains the bootstrap sequence of a single target engine: resolve, lock, reset,
    core select, scrub, load and authorize.

--*/

use lsboot_drivers::reg::falcon::StackCfg;
use lsboot_drivers::{
    cprintln, DescriptorResolver, EngineDescriptor, EngineFlags, HexU32, IsolationProtocol,
    LsAuthorizer, MmioMut, Poller, ResetController, SecureLoader, StatusReporter,
};
use lsboot_error::{BootResult, LsBootError};

use super::load::ImageLoader;
use crate::config::BootConfig;
use crate::env::BootEnv;
use crate::header::{BootFlags, FirmwareHeader};
use crate::outcome::{BootStage, TargetState};

pub(crate) type StageResult<T> = Result<T, (BootStage, LsBootError)>;

/// Attributes a driver error to the stage it occurred in.
trait AtStage<T> {
    fn at(self, stage: BootStage) -> StageResult<T>;
}

impl<T> AtStage<T> for BootResult<T> {
    fn at(self, stage: BootStage) -> StageResult<T> {
        self.map_err(|err| (stage, err))
    }
}

pub(crate) struct TargetFlow<'f, 'a, M: MmioMut> {
    env: &'f BootEnv<'a, M>,
    config: &'f BootConfig<'a>,
    reporter: &'f StatusReporter<'a, M>,
}

impl<'f, 'a, M: MmioMut> TargetFlow<'f, 'a, M> {
    pub fn new(
        env: &'f BootEnv<'a, M>,
        config: &'f BootConfig<'a>,
        reporter: &'f StatusReporter<'a, M>,
    ) -> Self {
        Self {
            env,
            config,
            reporter,
        }
    }

    /// Report entry into `state`.
    fn advance(&self, state: TargetState) {
        if let Some(status) = state.boot_status() {
            self.reporter.report_boot_status(status.into());
        }
    }

    fn poller(&self) -> Poller<'a> {
        Poller::new(self.env.timer, self.config.poll_timeout_ns)
    }

    /// Bootstrap the target named by `header`.
    ///
    /// The isolation reservation is released on every path out of this function, including
    /// fatal errors, before the result is returned.
    pub fn run(
        &self,
        protocol: &mut IsolationProtocol<'a, M>,
        header: &FirmwareHeader,
    ) -> StageResult<()> {
        let desc = self.resolve(header).at(BootStage::Resolve)?;
        self.advance(TargetState::Resolved);

        let mut guard = protocol.acquire(&desc).at(BootStage::Lock)?;
        self.advance(TargetState::Locked);

        let result = self.run_locked(&desc, header);

        guard.release();
        self.advance(TargetState::Unlocked {
            failed: result.is_err(),
        });

        if let Err((stage, err)) = result {
            cprintln!(
                "[lsboot] {} failed at {}: {}",
                desc.id,
                stage,
                HexU32(err.into())
            );
        }
        result
    }

    /// Reject malformed requests, then build the target's descriptor.
    fn resolve(&self, header: &FirmwareHeader) -> BootResult<EngineDescriptor> {
        let resolver = DescriptorResolver::new(self.env.chip);
        if !resolver.is_known(header.engine) {
            return Err(LsBootError::RESOLVER_ENGINE_NOT_FOUND);
        }
        if !resolver.is_instance_valid(header.engine, header.instance) {
            return Err(LsBootError::RESOLVER_INVALID_INSTANCE);
        }

        let instance_bit = 1u32.checked_shl(header.instance.into()).unwrap_or(0);
        if !resolver.is_index_mask_valid(header.engine, header.index_mask)
            || header.index_mask & instance_bit == 0
        {
            return Err(LsBootError::RESOLVER_INVALID_INDEX_MASK);
        }

        resolver.resolve(header.engine, header.instance)
    }

    fn run_locked(
        &self,
        desc: &EngineDescriptor,
        header: &FirmwareHeader,
    ) -> StageResult<()> {
        let mmio = self.env.mmio;
        let mut reset = ResetController::new(mmio, self.env.chip, self.poller());

        reset.pre_reset_sequence(desc).at(BootStage::Reset)?;
        reset.assert_reset(desc).at(BootStage::Reset)?;
        reset.deassert_reset(desc).at(BootStage::Reset)?;
        self.advance(TargetState::Reset);

        reset.select_core(desc).at(BootStage::CoreSelect)?;
        self.advance(TargetState::CoreSelected);

        reset.post_reset_sequence(desc).at(BootStage::Scrub)?;
        reset.poll_scrubbing(desc).at(BootStage::Scrub)?;
        self.advance(TargetState::Scrubbed);

        let mut authorizer = LsAuthorizer::new(mmio);
        authorizer.lower_bootstrap_plms(desc);

        let loader = SecureLoader::new(mmio, self.poller());
        let boot_vector = ImageLoader::new(
            &loader,
            self.env.wpr,
            self.env.verifier,
            self.config,
            desc,
            header,
        )
        .load()
        .at(BootStage::Load)?;
        self.program_boot(&loader, desc, header, boot_vector);
        self.advance(TargetState::Loaded);

        authorizer
            .set_final_register_plms(desc)
            .at(BootStage::Authorize)?;
        authorizer.authorize(desc).at(BootStage::Authorize)?;
        self.advance(TargetState::Authorized);

        Ok(())
    }

    /// Program the boot vector and the DMA and stack configuration the firmware starts with.
    fn program_boot(
        &self,
        loader: &SecureLoader<'a, M>,
        desc: &EngineDescriptor,
        header: &FirmwareHeader,
        boot_vector: u32,
    ) {
        let mmio = self.env.mmio;
        let falcon = desc.falcon();

        falcon.bootvec().write(mmio, boot_vector);
        falcon.dmactl().modify(mmio, |mut ctl| {
            ctl.set_require_ctx(header.flags.contains(BootFlags::REQUIRES_DMA_CONTEXT));
            ctl
        });

        if let Some(fbif) = desc.fbif() {
            fbif.transcfg(desc.ctx_dma).modify(mmio, |mut cfg| {
                let virt = header.flags.contains(BootFlags::NEEDS_VIRTUAL_CONTEXT);
                cfg.set_mem_type_physical(!virt);
                cfg
            });
        }

        if desc.flags.contains(EngineFlags::STACK_CFG) {
            let mut stack = StackCfg::default();
            stack.set_bottom(loader.dmem_size(desc) / 4);
            stack.set_spr_enable(true);
            falcon.stackcfg().write(mmio, stack);
        }
    }
}
