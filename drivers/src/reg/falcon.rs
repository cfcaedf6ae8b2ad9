/*++

Licensed under the Apache-2.0 license.

File Name:

    falcon.rs

Abstract:

    File contains the falcon, bus interface (FBIF) and RISC-V boot register blocks.

--*/

use bitfield::bitfield;

use super::plm::PrivLevelMask;
use super::Reg;

/// Size of one IMEM/DMEM block and of one DMA transfer.
pub const FALCON_BLOCK_SIZE: u32 = 256;

const CPUCTL: u32 = 0x100;
const BOOTVEC: u32 = 0x104;
const HWCFG: u32 = 0x108;
const DMACTL: u32 = 0x10c;
const DMATRFBASE: u32 = 0x110;
const DMATRFMOFFS: u32 = 0x114;
const DMATRFCMD: u32 = 0x118;
const DMATRFFBOFFS: u32 = 0x11c;
const DMATRFBASE1: u32 = 0x128;
const CPUCTL_ALIAS: u32 = 0x130;
const IMEMC: u32 = 0x180;
const IMEMD: u32 = 0x184;
const IMEMT: u32 = 0x188;
const DMEMC: u32 = 0x1c0;
const DMEMD: u32 = 0x1c4;
const LEGACY_REGIONCFG: u32 = 0x0f0;
const SCTL: u32 = 0x240;
const STACKCFG: u32 = 0x38c;

const PLM_IRQ: u32 = 0x400;
const PLM_TIMER: u32 = 0x404;
const PLM_BOOTVEC: u32 = 0x408;
const PLM_DMA: u32 = 0x40c;
const PLM_PRIVSTATE: u32 = 0x410;
const PLM_IMEM: u32 = 0x414;
const PLM_DMEM: u32 = 0x418;
const PLM_CPUCTL: u32 = 0x41c;
const PLM_LEGACY_REGIONCFG: u32 = 0x420;

const FBIF_TRANSCFG: u32 = 0x000;
const FBIF_CTL: u32 = 0x024;
const FBIF_REGIONCFG: u32 = 0x028;
const FBIF_REGIONCFG_PLM: u32 = 0x02c;
const FBIF_DMA_BASE_HI: u32 = 0x030;

const RISCV_BCR_CTRL: u32 = 0x068;
const RISCV_BCR_DMACFG: u32 = 0x06c;

bitfield! {
    /// CPU Control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct Cpuctl(u32);
    impl Debug;

    pub startcpu, set_startcpu: 1;
    pub halted, set_halted: 4;
    pub alias_en, set_alias_en: 6;
}

bitfield! {
    /// Hardware Configuration
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct Hwcfg(u32);
    impl Debug;

    /// IMEM size in blocks
    pub u32, imem_size, set_imem_size: 8, 0;

    /// DMEM size in blocks
    pub u32, dmem_size, set_dmem_size: 17, 9;
}

bitfield! {
    /// DMA Control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct Dmactl(u32);
    impl Debug;

    pub require_ctx, set_require_ctx: 0;
    pub dmem_scrubbing, set_dmem_scrubbing: 1;
    pub imem_scrubbing, set_imem_scrubbing: 2;
}

/// Encoded transfer size accepted by the `size` field of [`DmaTrfCmd`].
pub const DMA_TRF_SIZE_256B: u32 = 0x6;

bitfield! {
    /// DMA Transfer Command
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct DmaTrfCmd(u32);
    impl Debug;

    pub idle, set_idle: 1;
    pub sec, set_sec: 2;
    pub imem, set_imem: 4;

    /// Direction: set for engine to framebuffer
    pub write, set_write: 5;
    pub u32, size, set_size: 10, 8;
    pub u32, ctxdma, set_ctxdma: 14, 12;
}

bitfield! {
    /// IMEM/DMEM indirect port control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct MemPortCtl(u32);
    impl Debug;

    /// Word address of the next access
    pub u32, word_addr, set_word_addr: 23, 2;

    /// Auto-increment on write
    pub aincw, set_aincw: 24;

    /// Auto-increment on read
    pub aincr, set_aincr: 25;

    /// Tag the written block as secure
    pub secure, set_secure: 28;
}

bitfield! {
    /// LS (secure) control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct Sctl(u32);
    impl Debug;

    /// Mirror the reset privilege level
    pub reset_lvlm_en, set_reset_lvlm_en: 0;

    /// Clear stall requests on start
    pub stall_req_clr_en, set_stall_req_clr_en: 1;
    pub auth_en, set_auth_en: 2;
    pub ls_mode, set_ls_mode: 3;
    pub u8, ls_level, set_ls_level: 5, 4;
}

bitfield! {
    /// Stack configuration
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct StackCfg(u32);
    impl Debug;

    /// Stack bottom in words
    pub u32, bottom, set_bottom: 27, 2;
    pub spr_enable, set_spr_enable: 31;
}

/// Memory target of an FBIF transfer configuration.
pub const FBIF_TARGET_LOCAL_FB: u32 = 0;

bitfield! {
    /// FBIF Transfer Configuration
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct FbifTranscfg(u32);
    impl Debug;

    pub u32, target, set_target: 1, 0;

    /// Set for physical addressing, clear for virtual
    pub mem_type_physical, set_mem_type_physical: 2;
}

bitfield! {
    /// FBIF Control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct FbifCtl(u32);
    impl Debug;

    pub allow_phys_no_ctx, set_allow_phys_no_ctx: 7;
}

bitfield! {
    /// RISC-V Boot Configuration Control
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct BcrCtrl(u32);
    impl Debug;

    pub valid, set_valid: 0;

    /// Set for RISC-V, clear for falcon
    pub core_select, set_core_select: 4;
    pub br_fetch, set_br_fetch: 8;
}

bitfield! {
    /// RISC-V Boot Configuration DMA settings
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct BcrDmacfg(u32);
    impl Debug;

    pub u32, target, set_target: 1, 0;
    pub lock, set_lock: 31;
}

impl_raw_reg!(
    Cpuctl,
    Hwcfg,
    Dmactl,
    DmaTrfCmd,
    MemPortCtl,
    Sctl,
    StackCfg,
    FbifTranscfg,
    FbifCtl,
    BcrCtrl,
    BcrDmacfg
);

/// Region identifiers are packed four bits per context DMA index.
pub fn region_cfg_with(cfg: u32, ctx_dma: u8, region_id: u8) -> u32 {
    let shift = u32::from(ctx_dma & 0x7) * 4;
    (cfg & !(0xf << shift)) | (u32::from(region_id & 0xf) << shift)
}

/// Falcon register block of one engine.
#[derive(Clone, Copy, Debug)]
pub struct FalconRegs {
    base: u32,
}

impl FalconRegs {
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub fn cpuctl(&self) -> Reg<Cpuctl> {
        Reg::new(self.base + CPUCTL)
    }

    pub fn cpuctl_alias(&self) -> Reg<Cpuctl> {
        Reg::new(self.base + CPUCTL_ALIAS)
    }

    pub fn bootvec(&self) -> Reg<u32> {
        Reg::new(self.base + BOOTVEC)
    }

    pub fn hwcfg(&self) -> Reg<Hwcfg> {
        Reg::new(self.base + HWCFG)
    }

    pub fn dmactl(&self) -> Reg<Dmactl> {
        Reg::new(self.base + DMACTL)
    }

    pub fn dmatrfbase(&self) -> Reg<u32> {
        Reg::new(self.base + DMATRFBASE)
    }

    pub fn dmatrfbase1(&self) -> Reg<u32> {
        Reg::new(self.base + DMATRFBASE1)
    }

    pub fn dmatrfmoffs(&self) -> Reg<u32> {
        Reg::new(self.base + DMATRFMOFFS)
    }

    pub fn dmatrffboffs(&self) -> Reg<u32> {
        Reg::new(self.base + DMATRFFBOFFS)
    }

    pub fn dmatrfcmd(&self) -> Reg<DmaTrfCmd> {
        Reg::new(self.base + DMATRFCMD)
    }

    pub fn imemc(&self, port: u32) -> Reg<MemPortCtl> {
        Reg::new(self.base + IMEMC + port * 16)
    }

    pub fn imemd(&self, port: u32) -> Reg<u32> {
        Reg::new(self.base + IMEMD + port * 16)
    }

    pub fn imemt(&self, port: u32) -> Reg<u32> {
        Reg::new(self.base + IMEMT + port * 16)
    }

    pub fn dmemc(&self, port: u32) -> Reg<MemPortCtl> {
        Reg::new(self.base + DMEMC + port * 8)
    }

    pub fn dmemd(&self, port: u32) -> Reg<u32> {
        Reg::new(self.base + DMEMD + port * 8)
    }

    pub fn legacy_regioncfg(&self) -> Reg<u32> {
        Reg::new(self.base + LEGACY_REGIONCFG)
    }

    pub fn sctl(&self) -> Reg<Sctl> {
        Reg::new(self.base + SCTL)
    }

    pub fn stackcfg(&self) -> Reg<StackCfg> {
        Reg::new(self.base + STACKCFG)
    }

    pub fn plm(&self, reg: FalconPlm) -> Reg<PrivLevelMask> {
        let offset = match reg {
            FalconPlm::Irq => PLM_IRQ,
            FalconPlm::Timer => PLM_TIMER,
            FalconPlm::BootVec => PLM_BOOTVEC,
            FalconPlm::Dma => PLM_DMA,
            FalconPlm::PrivState => PLM_PRIVSTATE,
            FalconPlm::Imem => PLM_IMEM,
            FalconPlm::Dmem => PLM_DMEM,
            FalconPlm::Cpuctl => PLM_CPUCTL,
            FalconPlm::LegacyRegionCfg => PLM_LEGACY_REGIONCFG,
        };
        Reg::new(self.base + offset)
    }
}

/// PLM registers guarding classes of falcon registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FalconPlm {
    Irq,
    Timer,
    BootVec,
    Dma,
    PrivState,
    Imem,
    Dmem,
    Cpuctl,
    LegacyRegionCfg,
}

/// Bus interface (FBIF) register block of one engine.
#[derive(Clone, Copy, Debug)]
pub struct FbifRegs {
    base: u32,
}

impl FbifRegs {
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub fn transcfg(&self, ctx_dma: u8) -> Reg<FbifTranscfg> {
        Reg::new(self.base + FBIF_TRANSCFG + u32::from(ctx_dma & 0x7) * 4)
    }

    pub fn ctl(&self) -> Reg<FbifCtl> {
        Reg::new(self.base + FBIF_CTL)
    }

    pub fn regioncfg(&self) -> Reg<u32> {
        Reg::new(self.base + FBIF_REGIONCFG)
    }

    pub fn regioncfg_plm(&self) -> Reg<PrivLevelMask> {
        Reg::new(self.base + FBIF_REGIONCFG_PLM)
    }

    pub fn dma_base_hi(&self) -> Reg<u32> {
        Reg::new(self.base + FBIF_DMA_BASE_HI)
    }
}

/// RISC-V boot configuration register block of one engine.
#[derive(Clone, Copy, Debug)]
pub struct RiscvRegs {
    base: u32,
}

impl RiscvRegs {
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub fn bcr_ctrl(&self) -> Reg<BcrCtrl> {
        Reg::new(self.base + RISCV_BCR_CTRL)
    }

    pub fn bcr_dmacfg(&self) -> Reg<BcrDmacfg> {
        Reg::new(self.base + RISCV_BCR_DMACFG)
    }
}
