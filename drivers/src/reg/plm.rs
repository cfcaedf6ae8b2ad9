/*++

Licensed under the Apache-2.0 license.

File Name:

    plm.rs

Abstract:

    File contains the privilege level mask register layout shared by every PLM register.

--*/

use bitfield::bitfield;

/// Level 0 (unprivileged) access.
pub const PLM_LEVEL0: u8 = 0b0001;
/// Level 1 access.
pub const PLM_LEVEL1: u8 = 0b0010;
/// Level 2 (LS) access.
pub const PLM_LEVEL2: u8 = 0b0100;
/// Level 3 (highest) access.
pub const PLM_LEVEL3: u8 = 0b1000;

/// Every privilege level.
pub const PLM_ALL_LEVELS: u8 = PLM_LEVEL0 | PLM_LEVEL1 | PLM_LEVEL2 | PLM_LEVEL3;
/// Intermediate protection: LS and highest level.
pub const PLM_LEVEL2_AND_UP: u8 = PLM_LEVEL2 | PLM_LEVEL3;
/// Highest level only.
pub const PLM_LEVEL3_ONLY: u8 = PLM_LEVEL3;

/// Width of the source enable field.
pub const PLM_SOURCE_ENABLE_BITS: u8 = 20;

bitfield! {
    /// Privilege Level Mask
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct PrivLevelMask(u32);
    impl Debug;

    /// Levels allowed to read the protected register
    pub u8, read_protection, set_read_protection: 3, 0;

    /// Levels allowed to write the protected register
    pub u8, write_protection, set_write_protection: 7, 4;

    /// Report read violations
    pub read_violation, set_read_violation: 8;

    /// Report write violations
    pub write_violation, set_write_violation: 9;

    /// Block reads from sources outside `source_enable`
    pub source_read_control, set_source_read_control: 10;

    /// Block writes from sources outside `source_enable`
    pub source_write_control, set_source_write_control: 11;

    /// One bit per priv source allowed through
    pub u32, source_enable, set_source_enable: 31, 12;
}

impl_raw_reg!(PrivLevelMask);

/// Protection applied to one register class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlmPolicy {
    /// Readable and writable from every level.
    Level0Write,

    /// Writable from the LS level and above.
    Intermediate,

    /// Writable from the highest level only.
    HighestOnly,
}

impl PlmPolicy {
    pub fn write_levels(self) -> u8 {
        match self {
            PlmPolicy::Level0Write => PLM_ALL_LEVELS,
            PlmPolicy::Intermediate => PLM_LEVEL2_AND_UP,
            PlmPolicy::HighestOnly => PLM_LEVEL3_ONLY,
        }
    }
}

impl PrivLevelMask {
    /// Returns true if `source` has its bit set in `source_enable`.
    pub fn source_allowed(&self, source: u8) -> bool {
        source < PLM_SOURCE_ENABLE_BITS && self.source_enable() & (1 << source) != 0
    }

    /// Returns a copy narrowed so that no level gains access it did not already have.
    pub fn narrowed(&self, read_levels: u8, write_levels: u8) -> Self {
        let mut plm = *self;
        plm.set_read_protection(self.read_protection() & read_levels);
        plm.set_write_protection(self.write_protection() & write_levels);
        plm
    }

    /// Returns true if every access allowed by `self` is also allowed by `other`.
    pub fn is_subset_of(&self, other: &PrivLevelMask) -> bool {
        self.read_protection() & !other.read_protection() == 0
            && self.write_protection() & !other.write_protection() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plm_fields() {
        let mut plm = PrivLevelMask::default();
        plm.set_read_protection(PLM_ALL_LEVELS);
        plm.set_write_protection(PLM_LEVEL3_ONLY);
        plm.set_source_enable(0b101);
        assert_eq!(u32::from(plm), 0x0000_508f);
        assert!(plm.source_allowed(0));
        assert!(!plm.source_allowed(1));
        assert!(plm.source_allowed(2));
        assert!(!plm.source_allowed(31));
    }

    #[test]
    fn test_narrowed_never_widens() {
        let plm = PrivLevelMask::from(0xffff_f0cf);
        let narrowed = plm.narrowed(PLM_ALL_LEVELS, PLM_ALL_LEVELS);
        assert_eq!(narrowed.write_protection(), PLM_LEVEL2_AND_UP);
        assert!(narrowed.is_subset_of(&plm));

        let narrowed = plm.narrowed(PLM_ALL_LEVELS, PLM_LEVEL3_ONLY);
        assert_eq!(narrowed.write_protection(), PLM_LEVEL3_ONLY);
        assert_eq!(narrowed.source_enable(), plm.source_enable());
    }
}
