// Licensed under the Apache-2.0 license

use std::cell::Cell;

use lsboot_bootstrap::{
    BootConfig, BootEnv, BootFlags, Bootstrap, FirmwareHeader, FirmwareVerifier, ImageSection,
    SourceHalt, WprHeaderAccessor,
};
use lsboot_drivers::testing::{sample_chip, FakeEngine, FakeMmio, FakeTimer};
use lsboot_drivers::{
    BootResult, ChipConstants, ChipTable, DescriptorResolver, EngineDescriptor, EngineKind,
    LsBootError, WprRead,
};

pub const UCODE_OFFSET: u32 = 0x1000;
pub const WPR_SIZE: usize = 0x4000;
pub const WPR_BASE: u64 = 0x0000_0123_4560_0000;

/// WPR contents backed by a byte vector. Every byte holds the low bits of its own offset.
pub struct FakeWpr {
    pub bytes: Vec<u8>,
    pub headers: Vec<FirmwareHeader>,
}

impl FakeWpr {
    pub fn new(headers: Vec<FirmwareHeader>) -> Self {
        Self {
            bytes: (0..WPR_SIZE).map(|i| (i * 7) as u8).collect(),
            headers,
        }
    }

    pub fn word(&self, offset: u32) -> u32 {
        let i = offset as usize;
        u32::from_le_bytes(self.bytes[i..i + 4].try_into().unwrap())
    }
}

impl WprRead for FakeWpr {
    fn read_wpr(&self, offset: u32, buf: &mut [u8]) -> BootResult<()> {
        let start = offset as usize;
        let src = self
            .bytes
            .get(start..start + buf.len())
            .ok_or(LsBootError::LOADER_WPR_READ_FAILED)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl WprHeaderAccessor for FakeWpr {
    fn headers(&self) -> &[FirmwareHeader] {
        &self.headers
    }
}

pub struct FakeVerifier {
    pub accept: Cell<bool>,
    pub calls: Cell<u32>,
}

impl FirmwareVerifier for FakeVerifier {
    fn verify(&self, _header: &FirmwareHeader, _signature: &ImageSection) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.accept.get()
    }
}

/// Records the halt code, then unwinds out of the bootstrap.
pub struct PanicHalt {
    pub code: Cell<Option<u32>>,
}

impl SourceHalt for PanicHalt {
    fn halt(&self, code: u32) -> ! {
        self.code.set(Some(code));
        panic!("source halted with {code:#x}");
    }
}

/// Header with a bootloader, an application and a signature block laid out back to back.
pub fn header(engine: EngineKind, instance: u8) -> FirmwareHeader {
    FirmwareHeader {
        engine,
        instance,
        index_mask: 1 << instance,
        ucode_offset: UCODE_OFFSET,
        bl_code: ImageSection {
            offset: 0,
            size: 0x200,
        },
        bl_data: ImageSection {
            offset: 0x200,
            size: 0x100,
        },
        app_code: Some(ImageSection {
            offset: 0x300,
            size: 0x400,
        }),
        app_data: Some(ImageSection {
            offset: 0x700,
            size: 0x200,
        }),
        signature: Some(ImageSection {
            offset: 0x900,
            size: 0x100,
        }),
        flags: BootFlags::empty(),
    }
}

pub fn config() -> BootConfig<'static> {
    BootConfig {
        source: EngineKind::Gsp,
        poll_timeout_ns: 100_000,
        wpr_base: WPR_BASE,
        ..Default::default()
    }
}

/// A chip with one fake engine per resolvable header.
pub struct Harness {
    pub chip: ChipTable<'static>,
    pub mmio: FakeMmio,
    pub timer: FakeTimer,
    pub wpr: FakeWpr,
    pub verifier: FakeVerifier,
    pub halt: PanicHalt,
    pub engines: Vec<FakeEngine>,
}

impl Harness {
    pub fn new(headers: Vec<FirmwareHeader>) -> Self {
        let chip = sample_chip();
        let mmio = FakeMmio::new();
        let resolver = DescriptorResolver::new(&chip);
        let engines = headers
            .iter()
            .filter_map(|h| resolver.resolve(h.engine, h.instance).ok())
            .map(|desc| FakeEngine::install(&mmio, &chip, &desc))
            .collect();

        Self {
            chip,
            mmio,
            timer: FakeTimer::new(1_000),
            wpr: FakeWpr::new(headers),
            verifier: FakeVerifier {
                accept: Cell::new(true),
                calls: Cell::new(0),
            },
            halt: PanicHalt {
                code: Cell::new(None),
            },
            engines,
        }
    }

    pub fn engine(&self, kind: EngineKind, instance: u8) -> &FakeEngine {
        self.engines
            .iter()
            .find(|e| e.desc.id.kind == kind && e.desc.id.instance == instance)
            .unwrap()
    }

    pub fn desc(&self, kind: EngineKind, instance: u8) -> EngineDescriptor {
        self.engine(kind, instance).desc
    }

    /// PLM and target mask registers of an isolation cluster.
    pub fn cluster_regs(&self, cluster: u8) -> (u32, u32) {
        let cluster = self.chip.isolation_cluster(cluster).unwrap();
        (cluster.plm, cluster.target_mask)
    }

    pub fn env(&self) -> BootEnv<'_, FakeMmio> {
        BootEnv {
            mmio: &self.mmio,
            chip: &self.chip,
            timer: &self.timer,
            wpr: &self.wpr,
            verifier: &self.verifier,
            halt: &self.halt,
        }
    }

    pub fn bootstrap<'a>(&'a self, config: BootConfig<'a>) -> Bootstrap<'a, FakeMmio> {
        Bootstrap::new(self.env(), config)
    }
}
