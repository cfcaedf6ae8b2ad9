/*++

Licensed under the Apache-2.0 license.

File Name:

    boot_status.rs

Abstract:

    Bootstrap boot status codes.

--*/

const TARGET_BOOT_STATUS_BASE: u32 = 0x100;
const FLOW_BOOT_STATUS_BASE: u32 = 0x180;

/// Statuses used to log bootstrap progress.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsBootStatus {
    // Per-target statuses
    TargetResolved = TARGET_BOOT_STATUS_BASE,
    TargetLocked = TARGET_BOOT_STATUS_BASE + 1,
    TargetResetComplete = TARGET_BOOT_STATUS_BASE + 2,
    TargetCoreSelected = TARGET_BOOT_STATUS_BASE + 3,
    TargetScrubComplete = TARGET_BOOT_STATUS_BASE + 4,
    TargetLoaded = TARGET_BOOT_STATUS_BASE + 5,
    TargetAuthorized = TARGET_BOOT_STATUS_BASE + 6,
    TargetUnlocked = TARGET_BOOT_STATUS_BASE + 7,
    TargetFailed = TARGET_BOOT_STATUS_BASE + 8,

    // Flow statuses
    BootstrapStarted = FLOW_BOOT_STATUS_BASE,
    BootstrapComplete = FLOW_BOOT_STATUS_BASE + 1,
    RecoveryStarted = FLOW_BOOT_STATUS_BASE + 2,
}

impl From<LsBootStatus> for u32 {
    /// Converts to this type from the input type.
    fn from(status: LsBootStatus) -> u32 {
        status as u32
    }
}
