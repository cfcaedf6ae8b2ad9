/*++

Licensed under the Apache-2.0 license.

File Name:

    engine.rs

Abstract:

    File contains the closed set of engine identities and core personalities.

--*/

use lsboot_error::LsBootError;
use ufmt::{uDisplay, uWrite};

/// Engines the bootstrap engine knows how to bring up.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Power management unit
    Pmu = 0,

    /// Graphics front-end context switch controller
    Fecs = 2,

    /// Graphics GPC context switch controller
    Gpccs = 3,

    /// Video decoder
    Nvdec = 4,

    /// Security engine
    Sec2 = 7,

    /// GPU system processor
    Gsp = 8,

    /// Framebuffer falcon
    Fbfalcon = 9,

    /// Video encoder
    Nvenc = 11,

    /// JPEG decoder
    Nvjpg = 14,

    /// Optical flow accelerator
    Ofa = 15,
}

impl TryFrom<u32> for EngineKind {
    type Error = LsBootError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use EngineKind::*;

        let kind = match value {
            0 => Pmu,
            2 => Fecs,
            3 => Gpccs,
            4 => Nvdec,
            7 => Sec2,
            8 => Gsp,
            9 => Fbfalcon,
            11 => Nvenc,
            14 => Nvjpg,
            15 => Ofa,
            _ => return Err(LsBootError::RESOLVER_ENGINE_NOT_FOUND),
        };

        Ok(kind)
    }
}

impl From<EngineKind> for u32 {
    fn from(kind: EngineKind) -> u32 {
        kind as u32
    }
}

/// Groups of engines that share register-protection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFamily {
    Pmu,
    Graphics,
    Video,
    Security,
    Memory,
}

impl EngineKind {
    pub fn family(self) -> EngineFamily {
        match self {
            EngineKind::Pmu => EngineFamily::Pmu,
            EngineKind::Fecs | EngineKind::Gpccs => EngineFamily::Graphics,
            EngineKind::Nvdec | EngineKind::Nvenc | EngineKind::Nvjpg | EngineKind::Ofa => {
                EngineFamily::Video
            }
            EngineKind::Sec2 | EngineKind::Gsp => EngineFamily::Security,
            EngineKind::Fbfalcon => EngineFamily::Memory,
        }
    }

    /// Multi-instance engines need a per-instance lookup to find their registers and isolation
    /// cluster.
    pub fn is_multi_instance(self) -> bool {
        match self.family() {
            EngineFamily::Graphics | EngineFamily::Video => true,
            EngineFamily::Pmu | EngineFamily::Security | EngineFamily::Memory => false,
        }
    }

    /// The upper 32 bits of the DMA source address go through the bus interface's side-channel
    /// register instead of `DMATRFBASE1`.
    pub fn dma_base_hi_via_fbif(self) -> bool {
        match self.family() {
            EngineFamily::Memory => true,
            EngineFamily::Pmu
            | EngineFamily::Graphics
            | EngineFamily::Video
            | EngineFamily::Security => false,
        }
    }

    /// The engine owns its post-authorization interrupt and timer registers.
    pub fn owns_post_auth_registers(self) -> bool {
        matches!(self, EngineKind::Pmu)
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Pmu => "PMU",
            EngineKind::Fecs => "FECS",
            EngineKind::Gpccs => "GPCCS",
            EngineKind::Nvdec => "NVDEC",
            EngineKind::Sec2 => "SEC2",
            EngineKind::Gsp => "GSP",
            EngineKind::Fbfalcon => "FBFALCON",
            EngineKind::Nvenc => "NVENC",
            EngineKind::Nvjpg => "NVJPG",
            EngineKind::Ofa => "OFA",
        }
    }
}

impl uDisplay for EngineKind {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Instruction-set personality an engine boots into.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CoreType {
    /// Native falcon core
    #[default]
    Falcon,

    /// RISC-V core fetching its boot image through the boot configuration registers
    Riscv,

    /// RISC-V core with extended boot: boot fetch additionally goes through a locked DMA
    /// configuration
    RiscvEb,
}

impl CoreType {
    pub fn is_riscv(self) -> bool {
        match self {
            CoreType::Falcon => false,
            CoreType::Riscv | CoreType::RiscvEb => true,
        }
    }
}

/// An engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineId {
    pub kind: EngineKind,
    pub instance: u8,
}

impl EngineId {
    pub fn new(kind: EngineKind, instance: u8) -> Self {
        Self { kind, instance }
    }
}

impl uDisplay for EngineId {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "{}[{}]", self.kind, self.instance)
    }
}
