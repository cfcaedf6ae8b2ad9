/*++

Licensed under the Apache-2.0 license.

File Name:

    reset.rs

Abstract:

    File contains the engine reset controller: reset assertion, core selection, key fetch peer
    sequencing and memory scrub completion.

--*/

use lsboot_error::{BootResult, LsBootError};

use crate::cprintln;
use crate::descriptor::{ChipConstants, EngineDescriptor};
use crate::engine::CoreType;
use crate::mmio::MmioMut;
use crate::reg::falcon::{BcrCtrl, BcrDmacfg, FBIF_TARGET_LOCAL_FB};
use crate::reg::reset::{
    FuseLoaderStatus, KeyFetchState, KeyFetchStatus, SecureReset, RESET_STATUS_ASSERTED,
    RESET_STATUS_DEASSERTED,
};
use crate::reg::Reg;
use crate::wait::Poller;

/// Progress of one engine through the reset sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    InReset,
    OutOfReset,
    CoreSelected,
    ScrubComplete,
}

/// How reset is applied to a particular engine.
enum ResetPath {
    Secure(Reg<SecureReset>),
    Legacy { enable: u32, bit: u8 },
}

pub struct ResetController<'a, M: MmioMut> {
    mmio: &'a M,
    chip: &'a dyn ChipConstants,
    poller: Poller<'a>,
    state: Option<ResetState>,
}

impl<'a, M: MmioMut> ResetController<'a, M> {
    pub fn new(mmio: &'a M, chip: &'a dyn ChipConstants, poller: Poller<'a>) -> Self {
        Self {
            mmio,
            chip,
            poller,
            state: None,
        }
    }

    /// Last state reached, `None` before the first assert.
    pub fn state(&self) -> Option<ResetState> {
        self.state
    }

    /// Legacy global enable register and the engine's bit in it, when the engine has one.
    fn legacy_bit(&self, desc: &EngineDescriptor) -> Option<(u32, u8)> {
        let enable = self.chip.globals().legacy_enable;
        match desc.reset.legacy_enable_bit {
            Some(bit) if enable != 0 && bit < 32 => Some((enable, bit)),
            _ => None,
        }
    }

    fn path(&self, desc: &EngineDescriptor) -> BootResult<ResetPath> {
        if let Some(addr) = desc.reset.secure_reset {
            return Ok(ResetPath::Secure(Reg::new(addr)));
        }
        self.legacy_bit(desc)
            .map(|(enable, bit)| ResetPath::Legacy { enable, bit })
            .ok_or(LsBootError::RESET_INVALID_RESET_ADDRESS)
    }

    fn set_legacy_enable(&self, enable: u32, bit: u8) {
        self.mmio.modify(enable, |v| v | (1 << bit));
        let _ = self.mmio.read(enable);
    }

    fn wait_reset_status(&self, reg: Reg<SecureReset>, status: u32) -> BootResult<()> {
        self.poller.until(|| reg.read(self.mmio).status() == status)
    }

    /// Put the engine into reset.
    pub fn assert_reset(&mut self, desc: &EngineDescriptor) -> BootResult<()> {
        match self.path(desc)? {
            ResetPath::Secure(reg) => {
                let mut val = SecureReset::default();
                val.set_reset(true);
                reg.write(self.mmio, val);
                self.wait_reset_status(reg, RESET_STATUS_ASSERTED)?;
            }
            ResetPath::Legacy { enable, bit } => {
                self.mmio.modify(enable, |v| v & !(1 << bit));
                // Flush the write before the engine is touched again
                let _ = self.mmio.read(enable);
            }
        }
        self.state = Some(ResetState::InReset);
        Ok(())
    }

    /// Take the engine out of reset.
    pub fn deassert_reset(&mut self, desc: &EngineDescriptor) -> BootResult<()> {
        match self.path(desc)? {
            ResetPath::Secure(reg) => {
                reg.write(self.mmio, SecureReset::default());
                self.wait_reset_status(reg, RESET_STATUS_DEASSERTED)?;
                // Engines wired to both also need their global enable bit back
                if let Some((enable, bit)) = self.legacy_bit(desc) {
                    self.set_legacy_enable(enable, bit);
                }
            }
            ResetPath::Legacy { enable, bit } => self.set_legacy_enable(enable, bit),
        }
        self.state = Some(ResetState::OutOfReset);
        Ok(())
    }

    /// Select the core the engine boots into and confirm the hardware agrees with the declared
    /// core type.
    pub fn select_core(&mut self, desc: &EngineDescriptor) -> BootResult<()> {
        let want_riscv = match desc.core_type {
            CoreType::Falcon => false,
            CoreType::Riscv | CoreType::RiscvEb => true,
        };

        let Some(riscv) = desc.riscv() else {
            if want_riscv {
                cprintln!("[reset] {} declares RISC-V without RISC-V space", desc.id);
                return Err(LsBootError::RESET_CORE_SELECT_MISMATCH);
            }
            self.state = Some(ResetState::CoreSelected);
            return Ok(());
        };

        if desc.core_type == CoreType::RiscvEb {
            let mut dmacfg = BcrDmacfg::default();
            dmacfg.set_target(FBIF_TARGET_LOCAL_FB);
            dmacfg.set_lock(true);
            riscv.bcr_dmacfg().write(self.mmio, dmacfg);
        }

        let mut ctrl = BcrCtrl::default();
        ctrl.set_core_select(want_riscv);
        ctrl.set_br_fetch(want_riscv);
        riscv.bcr_ctrl().write(self.mmio, ctrl);

        let ctrl = self.poller.until_some(|| {
            let ctrl = riscv.bcr_ctrl().read(self.mmio);
            ctrl.valid().then_some(ctrl)
        })?;

        if ctrl.core_select() != want_riscv {
            cprintln!("[reset] {} core select mismatch", desc.id);
            return Err(LsBootError::RESET_CORE_SELECT_MISMATCH);
        }

        self.state = Some(ResetState::CoreSelected);
        Ok(())
    }

    /// Wait until the key fetch peer has no transaction in flight. Both errors raised here are
    /// fatal for the source.
    pub fn pre_reset_sequence(&self, desc: &EngineDescriptor) -> BootResult<()> {
        if !desc.key_fetch.participates() {
            return Ok(());
        }

        let status: Reg<KeyFetchStatus> = Reg::new(desc.key_fetch.status);
        let state = self
            .poller
            .until_some(|| match status.read(self.mmio).state() {
                KeyFetchState::InFlight => None,
                state => Some(state),
            })
            .map_err(|_| LsBootError::RESET_KEY_FETCH_STUCK)?;

        match state {
            KeyFetchState::Failed => Err(LsBootError::RESET_KEY_FETCH_FAILED),
            KeyFetchState::Idle | KeyFetchState::Complete | KeyFetchState::InFlight => Ok(()),
        }
    }

    /// Wait for the fuse version loader to settle after reset.
    pub fn post_reset_sequence(&self, desc: &EngineDescriptor) -> BootResult<()> {
        if desc.key_fetch.fuse_loader == 0 {
            return Ok(());
        }

        let loader: Reg<FuseLoaderStatus> = Reg::new(desc.key_fetch.fuse_loader);
        self.poller.until(|| {
            let status = loader.read(self.mmio);
            !status.busy() && status.valid()
        })
    }

    /// Wait for IMEM and DMEM scrubbing to finish.
    pub fn poll_scrubbing(&mut self, desc: &EngineDescriptor) -> BootResult<()> {
        let dmactl = desc.falcon().dmactl();
        self.poller.until(|| {
            let val = dmactl.read(self.mmio);
            !val.imem_scrubbing() && !val.dmem_scrubbing()
        })?;
        self.state = Some(ResetState::ScrubComplete);
        Ok(())
    }
}
