/*++

Licensed under the Apache-2.0 license.

File Name:

    isolation.rs

Abstract:

    File contains the register layout of a priv isolation cluster (TARGET_MASK, its PLM and
    its INDEX select register).

--*/

use bitfield::bitfield;

use super::plm::PrivLevelMask;
use super::Reg;

/// Number of priv sources representable in a target mask.
pub const TARGET_MASK_SOURCES: u8 = 16;

bitfield! {
    /// Isolation Target Mask
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct TargetMask(u32);
    impl Debug;

    /// One bit per source allowed to read the selected target
    pub u32, read_enable, set_read_enable: 15, 0;

    /// One bit per source allowed to write the selected target
    pub u32, write_enable, set_write_enable: 31, 16;
}

bitfield! {
    /// Isolation Target Select
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct TargetIndex(u32);
    impl Debug;

    pub u32, index, set_index: 7, 0;
}

impl_raw_reg!(TargetMask, TargetIndex);

impl TargetMask {
    /// Mask granting read+write to `source` and read-only access to every other source.
    pub fn exclusive_writer(source: u8) -> Self {
        let mut mask = TargetMask::default();
        mask.set_read_enable(0xffff);
        mask.set_write_enable(1 << source);
        mask
    }
}

/// Register addresses of one isolation cluster, supplied by the chip tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsolationCluster {
    /// PLM protecting the cluster itself
    pub plm: u32,

    /// Sub-target select register
    pub index: u32,

    /// Target mask of the selected sub-target
    pub target_mask: u32,
}

impl IsolationCluster {
    pub fn plm_reg(&self) -> Reg<PrivLevelMask> {
        Reg::new(self.plm)
    }

    pub fn index_reg(&self) -> Reg<TargetIndex> {
        Reg::new(self.index)
    }

    pub fn target_mask_reg(&self) -> Reg<TargetMask> {
        Reg::new(self.target_mask)
    }
}
