/*++

Licensed under the Apache-2.0 license.

File Name:

    fake_engine.rs

Abstract:

    File contains a synthetic chip table and a register-level model of a well-behaved engine
    built on top of `FakeMmio`.

--*/
use crate::descriptor::{
    ChipConstants, ChipGlobals, ChipTable, EngineDescriptor, EngineEntry, EngineFlags,
    InstanceEntry, IsolationTarget, KeyFetchRegs, SubWprRange,
};
use crate::engine::{CoreType, EngineKind};
use crate::reg::falcon::{BcrCtrl, DmaTrfCmd, FalconPlm, Hwcfg};
use crate::reg::isolation::IsolationCluster;
use crate::reg::reset::{SecureReset, RESET_STATUS_ASSERTED, RESET_STATUS_DEASSERTED};
use crate::testing::FakeMmio;

/// Value every PLM of the fake chip holds out of reset: all levels, all sources.
pub const OPEN_PLM: u32 = 0xffff_f0ff;

/// IMEM size of every fake engine, in blocks.
pub const FAKE_IMEM_BLOCKS: u32 = 0x100;

/// DMEM size of every fake engine, in blocks.
pub const FAKE_DMEM_BLOCKS: u32 = 0x80;

const BLANK: EngineEntry = EngineEntry {
    kind: EngineKind::Pmu,
    falcon_base: 0,
    fbif_base: 0,
    riscv_base: 0,
    secure_reset: 0,
    legacy_enable_bit: None,
    core_type: CoreType::Falcon,
    sub_wpr: SubWprRange {
        cfg_addr: 0,
        start_4k: 0,
        end_4k: 0,
    },
    isolation: IsolationTarget {
        cluster: 0,
        sub_target: 0,
    },
    ctx_dma: 0,
    default_plm: OPEN_PLM,
    final_plm: OPEN_PLM,
    flags: EngineFlags::empty(),
    key_fetch: KeyFetchRegs {
        status: 0,
        fuse_loader: 0,
    },
    source_id: None,
    instance_count: 1,
};

fn target(cluster: u8, sub_target: u8) -> IsolationTarget {
    IsolationTarget {
        cluster,
        sub_target,
    }
}

fn instance(
    kind: EngineKind,
    instance: u8,
    base_offset: u32,
    iso: IsolationTarget,
) -> InstanceEntry {
    InstanceEntry {
        kind,
        instance,
        base_offset,
        isolation: iso,
        legacy_enable_bit: Some(16 + instance),
    }
}

/// A chip with every engine kind except OFA.
///
/// FBFALCON is unpopulated in the current table and only resolvable through the previous
/// generation's table. NVDEC and GPCCS have two instances each.
pub fn sample_chip() -> ChipTable<'static> {
    let engines = vec![
        EngineEntry {
            kind: EngineKind::Pmu,
            falcon_base: 0x0010_a000,
            fbif_base: 0x0010_ae00,
            legacy_enable_bit: Some(13),
            isolation: target(0, 0),
            flags: EngineFlags::HAS_FBIF | EngineFlags::STACK_CFG,
            sub_wpr: SubWprRange {
                cfg_addr: 0x0010_ac00,
                start_4k: 0x100,
                end_4k: 0x1ff,
            },
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Fecs,
            falcon_base: 0x0040_9000,
            legacy_enable_bit: Some(12),
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Gpccs,
            falcon_base: 0x0041_a000,
            instance_count: 2,
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Nvdec,
            falcon_base: 0x0084_8000,
            fbif_base: 0x0084_8600,
            secure_reset: 0x0084_83c0,
            ctx_dma: 4,
            flags: EngineFlags::HAS_FBIF,
            instance_count: 2,
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Sec2,
            falcon_base: 0x0084_0000,
            fbif_base: 0x0084_0600,
            riscv_base: 0x0084_1000,
            secure_reset: 0x0084_03c0,
            isolation: target(2, 0),
            ctx_dma: 6,
            flags: EngineFlags::HAS_FBIF,
            key_fetch: KeyFetchRegs {
                status: 0x0084_0e00,
                fuse_loader: 0x0084_0e04,
            },
            source_id: Some(2),
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Gsp,
            falcon_base: 0x0011_0000,
            fbif_base: 0x0011_0600,
            riscv_base: 0x0011_1000,
            secure_reset: 0x0011_03c0,
            core_type: CoreType::Riscv,
            isolation: target(3, 0),
            flags: EngineFlags::HAS_FBIF,
            source_id: Some(1),
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Fbfalcon,
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Nvenc,
            falcon_base: 0x001c_2000,
            fbif_base: 0x001c_2600,
            secure_reset: 0x001c_23c0,
            flags: EngineFlags::HAS_FBIF,
            ..BLANK
        },
        EngineEntry {
            kind: EngineKind::Nvjpg,
            falcon_base: 0x0084_c000,
            fbif_base: 0x0084_c600,
            riscv_base: 0x0084_d000,
            secure_reset: 0x0084_c3c0,
            core_type: CoreType::RiscvEb,
            ctx_dma: 5,
            flags: EngineFlags::HAS_FBIF,
            ..BLANK
        },
    ];

    let legacy_engines = vec![EngineEntry {
        kind: EngineKind::Fbfalcon,
        falcon_base: 0x009a_4000,
        fbif_base: 0x009a_4600,
        legacy_enable_bit: Some(20),
        isolation: target(2, 1),
        flags: EngineFlags::HAS_FBIF,
        ..BLANK
    }];

    let instances = vec![
        instance(EngineKind::Fecs, 0, 0, target(0, 1)),
        instance(EngineKind::Gpccs, 0, 0, target(0, 2)),
        instance(EngineKind::Gpccs, 1, 0x0000_8000, target(0, 3)),
        instance(EngineKind::Nvdec, 0, 0, target(1, 0)),
        instance(EngineKind::Nvdec, 1, 0x0000_4000, target(1, 1)),
        instance(EngineKind::Nvenc, 0, 0, target(1, 3)),
        instance(EngineKind::Nvjpg, 0, 0, target(1, 2)),
    ];

    let clusters = (0..4u32)
        .map(|i| IsolationCluster {
            plm: 0x0010_0000 + i * 0x100,
            index: 0x0010_0004 + i * 0x100,
            target_mask: 0x0010_0008 + i * 0x100,
        })
        .collect::<Vec<_>>();

    ChipTable {
        engines: engines.leak(),
        legacy_engines: legacy_engines.leak(),
        instances: instances.leak(),
        clusters: clusters.leak(),
        globals: ChipGlobals {
            legacy_enable: 0x0000_0200,
            boot_status: 0x0000_0300,
            error_non_fatal: 0x0000_0304,
            error_fatal: 0x0000_0308,
        },
    }
}

/// Register-level model of one engine that answers every bootstrap request promptly.
///
/// Individual behaviours can be broken afterwards with `FakeMmio::on_write`, `stick` or `script`
/// on the addresses returned by the descriptor.
pub struct FakeEngine {
    pub desc: EngineDescriptor,
}

impl FakeEngine {
    /// Populates the engine's registers and installs the hooks modelling its hardware.
    pub fn install(mmio: &FakeMmio, chip: &dyn ChipConstants, desc: &EngineDescriptor) -> Self {
        let falcon = desc.falcon();

        let mut hwcfg = Hwcfg::default();
        hwcfg.set_imem_size(FAKE_IMEM_BLOCKS);
        hwcfg.set_dmem_size(FAKE_DMEM_BLOCKS);
        mmio.set(falcon.hwcfg().addr(), hwcfg.into());

        // Halted out of reset
        mmio.set(falcon.cpuctl().addr(), 1 << 4);

        // DMA completes as soon as it is issued
        mmio.on_write(falcon.dmatrfcmd().addr(), |cmd| {
            let mut cmd = DmaTrfCmd::from(cmd);
            cmd.set_idle(true);
            cmd.into()
        });

        for plm in [
            FalconPlm::Irq,
            FalconPlm::Timer,
            FalconPlm::BootVec,
            FalconPlm::Dma,
            FalconPlm::PrivState,
            FalconPlm::Imem,
            FalconPlm::Dmem,
            FalconPlm::Cpuctl,
            FalconPlm::LegacyRegionCfg,
        ] {
            mmio.set(falcon.plm(plm).addr(), OPEN_PLM);
        }

        if let Some(fbif) = desc.fbif() {
            mmio.set(fbif.regioncfg_plm().addr(), OPEN_PLM);
        }

        if let Some(riscv) = desc.riscv() {
            mmio.on_write(riscv.bcr_ctrl().addr(), |val| {
                let mut ctrl = BcrCtrl::from(val);
                ctrl.set_valid(true);
                ctrl.into()
            });
        }

        if let Some(addr) = desc.reset.secure_reset {
            let mut idle = SecureReset::default();
            idle.set_status(RESET_STATUS_DEASSERTED);
            mmio.set(addr, idle.into());
            mmio.on_write(addr, |val| {
                let mut reg = SecureReset::from(val);
                let status = if reg.reset() {
                    RESET_STATUS_ASSERTED
                } else {
                    RESET_STATUS_DEASSERTED
                };
                reg.set_status(status);
                reg.into()
            });
        }

        if desc.key_fetch.participates() {
            // Complete, and fuse loader valid
            mmio.set(desc.key_fetch.status, 2);
            mmio.set(desc.key_fetch.fuse_loader, 2);
        }

        if let Some(cluster) = chip.isolation_cluster(desc.isolation.cluster) {
            mmio.set(cluster.plm, OPEN_PLM);
            mmio.set(cluster.target_mask, 0xffff_ffff);
        }

        Self { desc: *desc }
    }

    /// Holds the secure reset status at ASSERTED regardless of what is written.
    pub fn hang_in_reset(&self, mmio: &FakeMmio) {
        if let Some(addr) = self.desc.reset.secure_reset {
            mmio.on_write(addr, |val| {
                let mut reg = SecureReset::from(val);
                reg.set_status(RESET_STATUS_ASSERTED);
                reg.into()
            });
        }
    }

    /// Makes the engine report that it is running.
    pub fn set_running(&self, mmio: &FakeMmio) {
        mmio.set(self.desc.falcon().cpuctl().addr(), 0);
    }
}
