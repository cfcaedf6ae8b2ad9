/*++

Licensed under the Apache-2.0 license.

File Name:

    descriptor.rs

Abstract:

    File contains the engine descriptor, the chip constant service it is built from and the
    resolver mapping (engine kind, instance) to a descriptor.

--*/

use lsboot_error::{BootResult, LsBootError};

use crate::engine::{CoreType, EngineId, EngineKind};
use crate::printer::HexU32;
use crate::reg::falcon::{FalconRegs, FbifRegs, RiscvRegs};
use crate::reg::isolation::IsolationCluster;
use crate::cprintln;

bitflags::bitflags! {
    /// Engine capabilities
    pub struct EngineFlags : u32 {
        /// Engine DMA goes through a bus interface (FBIF) block
        const HAS_FBIF = 0x01;

        /// Engine supports stack bottom configuration
        const STACK_CFG = 0x02;

        /// Firmware is read from the open carveout rather than the WPR region
        const OPEN_CARVEOUT = 0x04;

        /// Engine is booted without secure blocks
        const NON_SECURE = 0x08;
    }
}

/// How an engine is put into and out of reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResetStrategy {
    /// Dedicated secure reset register
    pub secure_reset: Option<u32>,

    /// Bit of the engine in the legacy global enable register
    pub legacy_enable_bit: Option<u8>,
}

/// Sub-region of WPR the engine may access once booted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubWprRange {
    /// Address of the sub-WPR start register; the end register follows it. Zero when the engine
    /// has no sub-WPR.
    pub cfg_addr: u32,

    /// First 4K page of the range
    pub start_4k: u32,

    /// Last 4K page of the range
    pub end_4k: u32,
}

/// Registers of the secure key fetch peer protocol. A zero status address marks an engine that
/// does not take part in the protocol.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyFetchRegs {
    pub status: u32,
    pub fuse_loader: u32,
}

impl KeyFetchRegs {
    pub fn participates(&self) -> bool {
        self.status != 0
    }
}

/// Which isolation cluster governs the engine and which sub-target inside it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IsolationTarget {
    pub cluster: u8,
    pub sub_target: u8,
}

/// Per-engine row of a chip constant table.
#[derive(Debug, Clone, Copy)]
pub struct EngineEntry {
    pub kind: EngineKind,
    pub falcon_base: u32,
    pub fbif_base: u32,
    pub riscv_base: u32,
    pub secure_reset: u32,
    pub legacy_enable_bit: Option<u8>,
    pub core_type: CoreType,
    pub sub_wpr: SubWprRange,
    pub isolation: IsolationTarget,
    pub ctx_dma: u8,
    pub default_plm: u32,
    pub final_plm: u32,
    pub flags: EngineFlags,
    pub key_fetch: KeyFetchRegs,

    /// Priv source identifier of the engine when it acts as a bootstrap source
    pub source_id: Option<u8>,
    pub instance_count: u8,
}

/// Per-instance row for multi-instance engines.
#[derive(Debug, Clone, Copy)]
pub struct InstanceEntry {
    pub kind: EngineKind,
    pub instance: u8,

    /// Added to every register base of the engine entry
    pub base_offset: u32,
    pub isolation: IsolationTarget,
    pub legacy_enable_bit: Option<u8>,
}

/// Chip-wide registers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChipGlobals {
    /// Legacy global engine enable register
    pub legacy_enable: u32,

    /// Boot progress register, zero when absent
    pub boot_status: u32,

    /// Non-fatal error register, zero when absent
    pub error_non_fatal: u32,

    /// Fatal error register, zero when absent
    pub error_fatal: u32,
}

/// Read-only chip constant service. One implementation is selected at startup per chip
/// generation.
pub trait ChipConstants {
    /// Entry of the current generation's table.
    fn engine(&self, kind: EngineKind) -> Option<&EngineEntry>;

    /// Entry of the previous generation's table, consulted when the current one is unpopulated.
    fn legacy_engine(&self, kind: EngineKind) -> Option<&EngineEntry>;

    /// Per-instance entry of a multi-instance engine.
    fn instance(&self, kind: EngineKind, instance: u8) -> Option<&InstanceEntry>;

    fn isolation_cluster(&self, index: u8) -> Option<&IsolationCluster>;

    fn globals(&self) -> &ChipGlobals;
}

/// Chip constants held in static tables.
#[derive(Debug, Clone, Copy)]
pub struct ChipTable<'a> {
    pub engines: &'a [EngineEntry],
    pub legacy_engines: &'a [EngineEntry],
    pub instances: &'a [InstanceEntry],
    pub clusters: &'a [IsolationCluster],
    pub globals: ChipGlobals,
}

impl ChipConstants for ChipTable<'_> {
    fn engine(&self, kind: EngineKind) -> Option<&EngineEntry> {
        self.engines.iter().find(|e| e.kind == kind)
    }

    fn legacy_engine(&self, kind: EngineKind) -> Option<&EngineEntry> {
        self.legacy_engines.iter().find(|e| e.kind == kind)
    }

    fn instance(&self, kind: EngineKind, instance: u8) -> Option<&InstanceEntry> {
        self.instances
            .iter()
            .find(|e| e.kind == kind && e.instance == instance)
    }

    fn isolation_cluster(&self, index: u8) -> Option<&IsolationCluster> {
        self.clusters.get(usize::from(index))
    }

    fn globals(&self) -> &ChipGlobals {
        &self.globals
    }
}

/// Everything the bootstrap components need to know about one target engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineDescriptor {
    pub id: EngineId,
    pub falcon_base: u32,
    pub fbif_base: Option<u32>,
    pub riscv_base: Option<u32>,
    pub reset: ResetStrategy,
    pub core_type: CoreType,
    pub sub_wpr: SubWprRange,
    pub isolation: IsolationTarget,
    pub ctx_dma: u8,

    /// Baseline PLM used when a PLM register reads back unprogrammed
    pub default_plm: u32,

    /// Template for the PLMs written at final authorization
    pub final_plm: u32,
    pub flags: EngineFlags,
    pub key_fetch: KeyFetchRegs,

    /// Resolved through the previous generation's table
    pub legacy_fallback: bool,
}

impl EngineDescriptor {
    pub fn falcon(&self) -> FalconRegs {
        FalconRegs::new(self.falcon_base)
    }

    pub fn fbif(&self) -> Option<FbifRegs> {
        self.fbif_base.map(FbifRegs::new)
    }

    pub fn riscv(&self) -> Option<RiscvRegs> {
        self.riscv_base.map(RiscvRegs::new)
    }

    pub fn has_fbif(&self) -> bool {
        self.flags.contains(EngineFlags::HAS_FBIF) && self.fbif_base.is_some()
    }
}

fn nonzero(addr: u32, offset: u32) -> Option<u32> {
    (addr != 0).then(|| addr + offset)
}

/// Maps (engine kind, instance) to an engine descriptor.
pub struct DescriptorResolver<'a> {
    chip: &'a dyn ChipConstants,
}

impl<'a> DescriptorResolver<'a> {
    pub fn new(chip: &'a dyn ChipConstants) -> Self {
        Self { chip }
    }

    pub fn chip(&self) -> &'a dyn ChipConstants {
        self.chip
    }

    /// Current entry of `kind`, falling back once to the previous generation when the current
    /// table has no row or an unpopulated falcon base.
    fn entry(&self, kind: EngineKind) -> Option<(&'a EngineEntry, bool)> {
        match self.chip.engine(kind) {
            Some(entry) if entry.falcon_base != 0 => Some((entry, false)),
            _ => self
                .chip
                .legacy_engine(kind)
                .filter(|entry| entry.falcon_base != 0)
                .map(|entry| (entry, true)),
        }
    }

    /// True when the chip has `kind`, directly or through the previous generation.
    pub fn is_known(&self, kind: EngineKind) -> bool {
        self.entry(kind).is_some()
    }

    /// Check that `instance` names an existing instance of `kind`.
    pub fn is_instance_valid(&self, kind: EngineKind, instance: u8) -> bool {
        let Some((entry, _)) = self.entry(kind) else {
            return false;
        };
        if instance >= entry.instance_count.max(1) {
            return false;
        }
        if kind.is_multi_instance() {
            self.chip.instance(kind, instance).is_some()
        } else {
            instance == 0
        }
    }

    /// Check that `mask` selects at least one instance and no instance beyond the engine's
    /// instance count.
    pub fn is_index_mask_valid(&self, kind: EngineKind, mask: u32) -> bool {
        let Some((entry, _)) = self.entry(kind) else {
            return false;
        };
        let count = u32::from(entry.instance_count.max(1));
        let valid = if count >= 32 {
            u32::MAX
        } else {
            (1u32 << count) - 1
        };
        mask != 0 && mask & !valid == 0
    }

    /// Priv source identifier of `kind` when it acts as the bootstrap source.
    pub fn source_id(&self, kind: EngineKind) -> BootResult<u8> {
        self.entry(kind)
            .and_then(|(entry, _)| entry.source_id)
            .ok_or(LsBootError::RESOLVER_NO_SOURCE_ID)
    }

    /// Build the descriptor of one engine instance.
    ///
    /// # Arguments
    ///
    /// * `kind` - Engine kind
    /// * `instance` - Instance index, zero for single-instance engines
    ///
    /// # Returns
    ///
    /// * `EngineDescriptor` - Descriptor with a non-zero falcon base
    pub fn resolve(&self, kind: EngineKind, instance: u8) -> BootResult<EngineDescriptor> {
        let (entry, legacy_fallback) = self
            .entry(kind)
            .ok_or(LsBootError::RESOLVER_ENGINE_NOT_FOUND)?;

        if legacy_fallback {
            cprintln!("[resolver] {} resolved from previous generation table", kind);
        }

        let (offset, isolation, legacy_enable_bit) = if kind.is_multi_instance() {
            if instance >= entry.instance_count.max(1) {
                return Err(LsBootError::RESOLVER_INVALID_INSTANCE);
            }
            let inst = self
                .chip
                .instance(kind, instance)
                .ok_or(LsBootError::RESOLVER_ENGINE_NOT_FOUND)?;
            (inst.base_offset, inst.isolation, inst.legacy_enable_bit)
        } else {
            if instance != 0 {
                return Err(LsBootError::RESOLVER_INVALID_INSTANCE);
            }
            (0, entry.isolation, entry.legacy_enable_bit)
        };

        let fbif_base = nonzero(entry.fbif_base, offset);
        let mut flags = entry.flags;
        flags.set(EngineFlags::HAS_FBIF, fbif_base.is_some());

        let descriptor = EngineDescriptor {
            id: EngineId::new(kind, instance),
            falcon_base: entry.falcon_base + offset,
            fbif_base,
            riscv_base: nonzero(entry.riscv_base, offset),
            reset: ResetStrategy {
                secure_reset: nonzero(entry.secure_reset, offset),
                legacy_enable_bit,
            },
            core_type: entry.core_type,
            sub_wpr: entry.sub_wpr,
            isolation,
            ctx_dma: entry.ctx_dma,
            default_plm: entry.default_plm,
            final_plm: entry.final_plm,
            flags,
            key_fetch: entry.key_fetch,
            legacy_fallback,
        };

        cprintln!(
            "[resolver] {} falcon base {}",
            descriptor.id,
            HexU32(descriptor.falcon_base)
        );

        Ok(descriptor)
    }
}
