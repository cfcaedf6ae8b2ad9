/*++

Licensed under the Apache-2.0 license.

File Name:

    isolation.rs

Abstract:

    File contains the priv isolation protocol granting the bootstrap source exclusive write
    access to a target's register space.

--*/

use lsboot_error::{BootResult, LsBootError};

use crate::cprintln;
use crate::descriptor::{ChipConstants, EngineDescriptor};
use crate::engine::EngineKind;
use crate::mmio::MmioMut;
use crate::printer::HexU32;
use crate::reg::isolation::{IsolationCluster, TargetIndex, TargetMask, TARGET_MASK_SOURCES};
use crate::reg::plm::PrivLevelMask;

/// An (engine kind, isolation cluster) combination for which isolation is not performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolationBypass {
    pub kind: EngineKind,
    pub cluster: u8,
}

/// Register values saved by a successful acquire and restored by release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationToken {
    pub cluster: u8,
    pub sub_target: u8,
    pub saved_plm: u32,
    pub saved_target_mask: u32,

    /// Acquire was skipped; release is a no-op
    pub bypassed: bool,
}

pub struct IsolationProtocol<'a, M: MmioMut> {
    mmio: &'a M,
    chip: &'a dyn ChipConstants,
    source: EngineKind,
    source_id: u8,
    bypass: &'a [IsolationBypass],
}

impl<'a, M: MmioMut> IsolationProtocol<'a, M> {
    /// Create the protocol for one bootstrap source.
    ///
    /// # Arguments
    ///
    /// * `mmio` - Priv bus
    /// * `chip` - Chip constants providing the isolation clusters
    /// * `source` - Engine kind of the bootstrap source
    /// * `source_id` - Priv source identifier of the bootstrap source
    pub fn new(
        mmio: &'a M,
        chip: &'a dyn ChipConstants,
        source: EngineKind,
        source_id: u8,
    ) -> BootResult<Self> {
        if source_id >= TARGET_MASK_SOURCES {
            return Err(LsBootError::ISOLATION_INVALID_SOURCE_ID);
        }
        Ok(Self {
            mmio,
            chip,
            source,
            source_id,
            bypass: &[],
        })
    }

    /// Skip isolation for the listed combinations. Only meaningful on emulation platforms; the
    /// caller decides whether to pass a non-empty list.
    pub fn with_bypass(mut self, bypass: &'a [IsolationBypass]) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn source(&self) -> EngineKind {
        self.source
    }

    fn cluster(&self, index: u8) -> BootResult<&'a IsolationCluster> {
        self.chip
            .isolation_cluster(index)
            .ok_or(LsBootError::ISOLATION_UNKNOWN_CLUSTER)
    }

    fn is_bypassed(&self, target: &EngineDescriptor) -> bool {
        self.bypass
            .iter()
            .any(|b| b.kind == target.id.kind && b.cluster == target.isolation.cluster)
    }

    /// Acquire exclusive access to `target` and return a token describing what to restore.
    ///
    /// Prefer [`IsolationProtocol::acquire`], which releases on every exit path.
    pub fn acquire_token(&self, target: &EngineDescriptor) -> BootResult<ReservationToken> {
        if target.id.kind == self.source {
            return Err(LsBootError::ISOLATION_SELF_ISOLATION_REJECTED);
        }

        if self.is_bypassed(target) {
            cprintln!("[isolation] {} bypassed", target.id);
            return Ok(ReservationToken {
                cluster: target.isolation.cluster,
                sub_target: target.isolation.sub_target,
                saved_plm: 0,
                saved_target_mask: 0,
                bypassed: true,
            });
        }

        let cluster = self.cluster(target.isolation.cluster)?;

        let plm = cluster.plm_reg().read(self.mmio);
        if !plm.source_allowed(self.source_id) {
            cprintln!(
                "[isolation] {} denied, plm {}",
                target.id,
                HexU32(plm.into())
            );
            return Err(LsBootError::ISOLATION_PERMISSION_DENIED);
        }

        let mut locked = plm;
        locked.set_source_enable(1 << self.source_id);
        locked.set_source_read_control(true);
        locked.set_source_write_control(true);
        cluster.plm_reg().write(self.mmio, locked);

        let mut index = TargetIndex::default();
        index.set_index(target.isolation.sub_target.into());
        cluster.index_reg().write(self.mmio, index);

        let saved_target_mask = cluster.target_mask_reg().read(self.mmio);
        cluster
            .target_mask_reg()
            .write(self.mmio, TargetMask::exclusive_writer(self.source_id));

        cprintln!("[isolation] {} locked", target.id);

        Ok(ReservationToken {
            cluster: target.isolation.cluster,
            sub_target: target.isolation.sub_target,
            saved_plm: plm.into(),
            saved_target_mask: saved_target_mask.into(),
            bypassed: false,
        })
    }

    /// Restore the registers saved in `token`. Releasing the same token again rewrites the same
    /// values.
    pub fn release(&self, token: &ReservationToken) {
        if token.bypassed {
            return;
        }

        // The token was produced by a successful acquire, so the cluster exists.
        let Ok(cluster) = self.cluster(token.cluster) else {
            return;
        };

        let mut index = TargetIndex::default();
        index.set_index(token.sub_target.into());
        cluster.index_reg().write(self.mmio, index);
        cluster
            .target_mask_reg()
            .write(self.mmio, TargetMask::from(token.saved_target_mask));
        cluster
            .plm_reg()
            .write(self.mmio, PrivLevelMask::from(token.saved_plm));
    }

    /// Acquire exclusive access to `target`.
    ///
    /// # Returns
    ///
    /// * `IsolationGuard` - Releases the reservation when dropped
    pub fn acquire(
        &mut self,
        target: &EngineDescriptor,
    ) -> BootResult<IsolationGuard<'_, 'a, M>> {
        let token = self.acquire_token(target)?;
        Ok(IsolationGuard {
            protocol: self,
            token,
            released: false,
        })
    }
}

/// Scoped reservation of a target's isolation cluster.
///
/// Holding the guard mutably borrows the protocol, so a second reservation cannot be taken while
/// this one is live.
#[must_use]
pub struct IsolationGuard<'p, 'a, M: MmioMut> {
    protocol: &'p mut IsolationProtocol<'a, M>,
    token: ReservationToken,
    released: bool,
}

impl<M: MmioMut> IsolationGuard<'_, '_, M> {
    pub fn token(&self) -> &ReservationToken {
        &self.token
    }

    /// Release now. Safe to call more than once; drop does nothing afterwards.
    pub fn release(&mut self) {
        self.protocol.release(&self.token);
        if !self.released {
            cprintln!("[isolation] cluster {} released", self.token.cluster);
        }
        self.released = true;
    }
}

impl<M: MmioMut> Drop for IsolationGuard<'_, '_, M> {
    fn drop(&mut self) {
        if !self.released {
            self.release();
        }
    }
}
