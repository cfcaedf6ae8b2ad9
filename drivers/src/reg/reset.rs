/*++

Licensed under the Apache-2.0 license.

File Name:

    reset.rs

Abstract:

    File contains the secure reset, key fetch peer and fuse-version loader register layouts.

--*/

use bitfield::bitfield;

/// `status` value reported while the engine is held in reset.
pub const RESET_STATUS_ASSERTED: u32 = 0;
/// `status` value reported once the engine left reset.
pub const RESET_STATUS_DEASSERTED: u32 = 2;

bitfield! {
    /// Secure engine reset
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct SecureReset(u32);
    impl Debug;

    /// Write 1 to hold the engine in reset, 0 to release it
    pub reset, set_reset: 0;
    pub u32, status, set_status: 10, 8;
}

/// Transaction state reported by the key fetch peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFetchState {
    Idle,
    InFlight,
    Complete,
    Failed,
}

bitfield! {
    /// Secure key fetch status
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct KeyFetchStatus(u32);
    impl Debug;

    pub u32, state_raw, set_state_raw: 1, 0;
}

impl KeyFetchStatus {
    pub fn state(&self) -> KeyFetchState {
        match self.state_raw() {
            0 => KeyFetchState::Idle,
            1 => KeyFetchState::InFlight,
            2 => KeyFetchState::Complete,
            _ => KeyFetchState::Failed,
        }
    }
}

bitfield! {
    /// Fuse version loader status
    #[derive(Default, PartialEq, Eq, Clone, Copy)]
    pub struct FuseLoaderStatus(u32);
    impl Debug;

    pub busy, set_busy: 0;
    pub valid, set_valid: 1;
}

impl_raw_reg!(SecureReset, KeyFetchStatus, FuseLoaderStatus);
