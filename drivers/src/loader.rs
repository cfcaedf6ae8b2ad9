/*++

Licensed under the Apache-2.0 license.

File Name:

    loader.rs

Abstract:

    File contains the secure loader copying firmware out of WPR into engine IMEM/DMEM, by DMA or
    through the indirect memory ports.

--*/

use lsboot_error::{BootResult, LsBootError};

use crate::descriptor::EngineDescriptor;
use crate::mmio::MmioMut;
use crate::printer::HexU32;
use crate::reg::falcon::{
    region_cfg_with, DmaTrfCmd, Dmactl, FbifTranscfg, MemPortCtl, DMA_TRF_SIZE_256B,
    FALCON_BLOCK_SIZE, FBIF_TARGET_LOCAL_FB,
};
use crate::wait::Poller;
use crate::cprintln;

/// Memory port used for programmed I/O.
const PIO_PORT: u32 = 0;

/// Read access to the write-protected region holding the firmware images.
pub trait WprRead {
    /// Fill `buf` with the bytes at `offset` from the start of WPR.
    fn read_wpr(&self, offset: u32, buf: &mut [u8]) -> BootResult<()>;
}

/// Memory of the target the bytes land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTarget {
    Imem,
    Dmem,
}

/// How bytes reach the target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LoadMethod {
    #[default]
    Dma,

    /// Indirect port writes, for stages where DMA cannot be trusted
    Pio,
}

/// One copy from WPR into target memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Byte offset in target memory
    pub dst_offset: u32,

    /// Physical address of WPR
    pub fb_base: u64,

    /// Byte offset of the source within WPR
    pub fb_offset: u32,
    pub size: u32,

    /// WPR region identifier the engine presents on its DMA requests
    pub region_id: u8,
    pub target: MemoryTarget,

    /// Tag the written IMEM blocks as secure
    pub secure: bool,
}

impl Transfer {
    fn blocks(&self) -> impl Iterator<Item = u32> {
        (0..self.size / FALCON_BLOCK_SIZE).map(|block| block * FALCON_BLOCK_SIZE)
    }

    /// Reject the transfer before any register is touched.
    fn validate(&self) -> BootResult<()> {
        let aligned = |val: u64| val % u64::from(FALCON_BLOCK_SIZE) == 0;
        if !aligned(self.size.into())
            || !aligned(self.dst_offset.into())
            || !aligned(self.fb_offset.into())
            || !aligned(self.fb_base)
        {
            return Err(LsBootError::LOADER_MISALIGNED_TRANSFER);
        }
        if self.secure && self.target != MemoryTarget::Imem {
            return Err(LsBootError::LOADER_INVALID_SECURE_BLOCK_REQUEST);
        }
        if self.dst_offset.checked_add(self.size).is_none()
            || self.fb_offset.checked_add(self.size).is_none()
        {
            return Err(LsBootError::LOADER_IMAGE_TOO_LARGE);
        }
        Ok(())
    }
}

pub struct SecureLoader<'a, M: MmioMut> {
    mmio: &'a M,
    poller: Poller<'a>,
}

impl<'a, M: MmioMut> SecureLoader<'a, M> {
    pub fn new(mmio: &'a M, poller: Poller<'a>) -> Self {
        Self { mmio, poller }
    }

    /// IMEM offset the code image is loaded at.
    ///
    /// # Arguments
    ///
    /// * `desc` - Target engine
    /// * `code_size` - Size of the code image in bytes
    /// * `load_at_zero` - Image is linked to run from IMEM offset zero
    ///
    /// # Returns
    ///
    /// * `u32` - Zero, or the highest block-aligned offset the image fits at
    pub fn compute_load_offset(
        &self,
        desc: &EngineDescriptor,
        code_size: u32,
        load_at_zero: bool,
    ) -> BootResult<u32> {
        let imem_blocks = desc.falcon().hwcfg().read(self.mmio).imem_size();
        let code_blocks = code_size.div_ceil(FALCON_BLOCK_SIZE);
        if code_blocks > imem_blocks {
            cprintln!(
                "[loader] {} image {} exceeds IMEM",
                desc.id,
                HexU32(code_size)
            );
            return Err(LsBootError::LOADER_IMAGE_TOO_LARGE);
        }
        if load_at_zero {
            return Ok(0);
        }
        Ok((imem_blocks - code_blocks) * FALCON_BLOCK_SIZE)
    }

    /// IMEM size of the target in bytes.
    pub fn imem_size(&self, desc: &EngineDescriptor) -> u32 {
        desc.falcon().hwcfg().read(self.mmio).imem_size() * FALCON_BLOCK_SIZE
    }

    /// DMEM size of the target in bytes.
    pub fn dmem_size(&self, desc: &EngineDescriptor) -> u32 {
        desc.falcon().hwcfg().read(self.mmio).dmem_size() * FALCON_BLOCK_SIZE
    }

    /// Copy `xfer` using `method`.
    pub fn load<W: WprRead + ?Sized>(
        &self,
        desc: &EngineDescriptor,
        xfer: &Transfer,
        method: LoadMethod,
        wpr: &W,
    ) -> BootResult<()> {
        match method {
            LoadMethod::Dma => self.issue_dma(desc, xfer),
            LoadMethod::Pio => self.issue_pio(desc, xfer, wpr),
        }
    }

    fn program_region(&self, desc: &EngineDescriptor, region_id: u8) {
        match desc.fbif() {
            Some(fbif) if desc.has_fbif() => {
                let mut transcfg = FbifTranscfg::default();
                transcfg.set_target(FBIF_TARGET_LOCAL_FB);
                transcfg.set_mem_type_physical(true);
                fbif.transcfg(desc.ctx_dma).write(self.mmio, transcfg);
                fbif.ctl().modify(self.mmio, |mut ctl| {
                    ctl.set_allow_phys_no_ctx(true);
                    ctl
                });
                fbif.regioncfg()
                    .modify(self.mmio, |cfg| region_cfg_with(cfg, desc.ctx_dma, region_id));
            }
            _ => {
                desc.falcon()
                    .legacy_regioncfg()
                    .modify(self.mmio, |cfg| region_cfg_with(cfg, desc.ctx_dma, region_id));
            }
        }
    }

    fn program_base(&self, desc: &EngineDescriptor, fb_base: u64) {
        let falcon = desc.falcon();
        falcon.dmatrfbase().write(self.mmio, (fb_base >> 8) as u32);

        let hi = (fb_base >> 40) as u32;
        match desc.fbif() {
            Some(fbif) if desc.id.kind.dma_base_hi_via_fbif() => {
                fbif.dma_base_hi().write(self.mmio, hi)
            }
            _ => falcon.dmatrfbase1().write(self.mmio, hi),
        }
    }

    /// Copy `xfer` with the engine's DMA, one 256-byte block at a time in increasing order.
    pub fn issue_dma(&self, desc: &EngineDescriptor, xfer: &Transfer) -> BootResult<()> {
        xfer.validate()?;

        let falcon = desc.falcon();

        self.program_region(desc, xfer.region_id);
        falcon.dmactl().write(self.mmio, Dmactl::default());
        self.program_base(desc, xfer.fb_base);

        let mut cmd = DmaTrfCmd::default();
        cmd.set_imem(xfer.target == MemoryTarget::Imem);
        cmd.set_sec(xfer.secure);
        cmd.set_size(DMA_TRF_SIZE_256B);
        cmd.set_ctxdma(desc.ctx_dma.into());

        for offset in xfer.blocks() {
            falcon
                .dmatrfmoffs()
                .write(self.mmio, xfer.dst_offset + offset);
            falcon
                .dmatrffboffs()
                .write(self.mmio, xfer.fb_offset + offset);
            falcon.dmatrfcmd().write(self.mmio, cmd);
            self.poller
                .until(|| falcon.dmatrfcmd().read(self.mmio).idle())?;
        }

        Ok(())
    }

    /// Copy `xfer` through the indirect IMEM/DMEM ports, reading the source bytes from `wpr`.
    pub fn issue_pio<W: WprRead + ?Sized>(
        &self,
        desc: &EngineDescriptor,
        xfer: &Transfer,
        wpr: &W,
    ) -> BootResult<()> {
        xfer.validate()?;

        let falcon = desc.falcon();

        let mut ctl = MemPortCtl::default();
        ctl.set_word_addr(xfer.dst_offset / 4);
        ctl.set_aincw(true);
        ctl.set_secure(xfer.secure);

        let data = match xfer.target {
            MemoryTarget::Imem => {
                falcon.imemc(PIO_PORT).write(self.mmio, ctl);
                falcon.imemd(PIO_PORT)
            }
            MemoryTarget::Dmem => {
                falcon.dmemc(PIO_PORT).write(self.mmio, ctl);
                falcon.dmemd(PIO_PORT)
            }
        };

        let mut block = [0u8; FALCON_BLOCK_SIZE as usize];
        for offset in xfer.blocks() {
            wpr.read_wpr(xfer.fb_offset + offset, &mut block)?;

            if xfer.target == MemoryTarget::Imem {
                let tag = (xfer.dst_offset + offset) / FALCON_BLOCK_SIZE;
                falcon.imemt(PIO_PORT).write(self.mmio, tag);
            }

            for word in block.chunks_exact(4) {
                data.write(
                    self.mmio,
                    u32::from_le_bytes([word[0], word[1], word[2], word[3]]),
                );
            }
        }

        Ok(())
    }
}
