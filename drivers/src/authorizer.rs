/*++

Licensed under the Apache-2.0 license.

File Name:

    authorizer.rs

Abstract:

    File contains the PLM tightening steps and the final transition of a target into
    Light-Secure mode.

--*/

use lsboot_error::{BootResult, LsBootError};

use crate::cprintln;
use crate::descriptor::EngineDescriptor;
use crate::engine::EngineFamily;
use crate::mmio::MmioMut;
use crate::reg::falcon::{FalconPlm, Sctl};
use crate::reg::plm::{
    PlmPolicy, PrivLevelMask, PLM_ALL_LEVELS, PLM_LEVEL2_AND_UP, PLM_LEVEL3_ONLY,
};

/// Privilege level the target runs at once authorized.
pub const LS_LEVEL: u8 = 2;

const COMMON_FINAL_PLMS: &[(FalconPlm, PlmPolicy)] = &[
    (FalconPlm::Irq, PlmPolicy::Level0Write),
    (FalconPlm::Timer, PlmPolicy::Level0Write),
    (FalconPlm::BootVec, PlmPolicy::HighestOnly),
    (FalconPlm::Dma, PlmPolicy::HighestOnly),
    (FalconPlm::Cpuctl, PlmPolicy::HighestOnly),
];

// Graphics engines leave CPUCTL to the context switch scheduler.
const GRAPHICS_FINAL_PLMS: &[(FalconPlm, PlmPolicy)] = &[
    (FalconPlm::Irq, PlmPolicy::Level0Write),
    (FalconPlm::Timer, PlmPolicy::Level0Write),
    (FalconPlm::BootVec, PlmPolicy::HighestOnly),
    (FalconPlm::Dma, PlmPolicy::HighestOnly),
];

// PMU interrupts and timers stay locked until authorize hands them over.
const PMU_FINAL_PLMS: &[(FalconPlm, PlmPolicy)] = &[
    (FalconPlm::Irq, PlmPolicy::Intermediate),
    (FalconPlm::Timer, PlmPolicy::Intermediate),
    (FalconPlm::BootVec, PlmPolicy::HighestOnly),
    (FalconPlm::Dma, PlmPolicy::HighestOnly),
    (FalconPlm::Cpuctl, PlmPolicy::HighestOnly),
];

fn final_plms(family: EngineFamily) -> &'static [(FalconPlm, PlmPolicy)] {
    match family {
        EngineFamily::Pmu => PMU_FINAL_PLMS,
        EngineFamily::Graphics => GRAPHICS_FINAL_PLMS,
        EngineFamily::Video | EngineFamily::Security | EngineFamily::Memory => COMMON_FINAL_PLMS,
    }
}

/// Applies the protection steps of one bootstrap attempt.
pub struct LsAuthorizer<'a, M: MmioMut> {
    mmio: &'a M,
    final_applied: bool,
}

impl<'a, M: MmioMut> LsAuthorizer<'a, M> {
    pub fn new(mmio: &'a M) -> Self {
        Self {
            mmio,
            final_applied: false,
        }
    }

    /// Current PLM, or the engine's default when the register reads back unprogrammed.
    fn baseline(&self, desc: &EngineDescriptor, reg: FalconPlm) -> PrivLevelMask {
        match u32::from(desc.falcon().plm(reg).read(self.mmio)) {
            0 => PrivLevelMask::from(desc.default_plm),
            val => PrivLevelMask::from(val),
        }
    }

    fn narrow(&self, desc: &EngineDescriptor, reg: FalconPlm, read: u8, write: u8) {
        let plm = self.baseline(desc, reg).narrowed(read, write);
        desc.falcon().plm(reg).write(self.mmio, plm);
    }

    /// Close the target's private state and memories to everything below the LS level while it
    /// is being loaded.
    pub fn lower_bootstrap_plms(&self, desc: &EngineDescriptor) {
        self.narrow(desc, FalconPlm::PrivState, PLM_ALL_LEVELS, PLM_LEVEL3_ONLY);
        self.narrow(desc, FalconPlm::Imem, PLM_ALL_LEVELS, PLM_LEVEL2_AND_UP);
        self.narrow(desc, FalconPlm::Dmem, PLM_ALL_LEVELS, PLM_LEVEL2_AND_UP);
    }

    /// Write the protection the target keeps after bootstrap. May only be called once per
    /// attempt.
    pub fn set_final_register_plms(&mut self, desc: &EngineDescriptor) -> BootResult<()> {
        if self.final_applied {
            return Err(LsBootError::AUTH_FINAL_PLMS_ALREADY_APPLIED);
        }

        let falcon = desc.falcon();
        let template = PrivLevelMask::from(desc.final_plm);

        for &(reg, policy) in final_plms(desc.id.kind.family()) {
            let mut plm = template;
            plm.set_write_protection(policy.write_levels());
            falcon.plm(reg).write(self.mmio, plm);
        }

        match desc.fbif() {
            Some(fbif) if desc.has_fbif() => {
                let mut plm = template;
                plm.set_write_protection(PlmPolicy::Intermediate.write_levels());
                fbif.regioncfg_plm().write(self.mmio, plm);
            }
            _ => {
                falcon
                    .plm(FalconPlm::LegacyRegionCfg)
                    .modify(self.mmio, |plm| {
                        plm.narrowed(PLM_ALL_LEVELS, PlmPolicy::Intermediate.write_levels())
                    });
            }
        }

        let sub_wpr = desc.sub_wpr;
        if sub_wpr.cfg_addr != 0 {
            self.mmio.write(sub_wpr.cfg_addr, sub_wpr.start_4k);
            self.mmio.write(sub_wpr.cfg_addr + 4, sub_wpr.end_4k);
        }

        self.final_applied = true;
        Ok(())
    }

    pub fn final_applied(&self) -> bool {
        self.final_applied
    }

    /// Switch the halted target into Light-Secure mode.
    ///
    /// # Returns
    ///
    /// * `LsBootError::AUTH_NOT_HALTED` - Target is running, nothing was written
    /// * `LsBootError::AUTH_REJECTED` - Hardware refused to enable authentication
    pub fn authorize(&self, desc: &EngineDescriptor) -> BootResult<()> {
        let falcon = desc.falcon();

        if !falcon.cpuctl().read(self.mmio).halted() {
            cprintln!("[auth] {} is not halted", desc.id);
            return Err(LsBootError::AUTH_NOT_HALTED);
        }

        let mut sctl = Sctl::default();
        sctl.set_reset_lvlm_en(true);
        sctl.set_stall_req_clr_en(true);
        sctl.set_auth_en(true);
        sctl.set_ls_mode(true);
        sctl.set_ls_level(LS_LEVEL);
        falcon.sctl().write(self.mmio, sctl);

        if !falcon.sctl().read(self.mmio).auth_en() {
            cprintln!("[auth] {} rejected", desc.id);
            return Err(LsBootError::AUTH_REJECTED);
        }

        falcon.cpuctl().modify(self.mmio, |mut cpuctl| {
            cpuctl.set_alias_en(true);
            cpuctl
        });

        if desc.id.kind.owns_post_auth_registers() {
            let mut plm = PrivLevelMask::from(desc.final_plm);
            plm.set_write_protection(PlmPolicy::Level0Write.write_levels());
            falcon.plm(FalconPlm::Irq).write(self.mmio, plm);
            falcon.plm(FalconPlm::Timer).write(self.mmio, plm);
        }

        cprintln!("[auth] {} authorized", desc.id);
        Ok(())
    }
}
