/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the bootstrap engine for error handling

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// LS Bootstrap Error Type
///
/// The upper 16 bits identify the component raising the error, the lower 16 bits the
/// condition within that component.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LsBootError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: LsBootError = LsBootError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(& 'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl LsBootError {
    /// Create an error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get an LsBootError from a u32 is to
    /// use `LsBootError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("LsBootError cannot be 0"),
        }
    }

    define_error_constants![
        (INVALID_ARGUMENT, 0x0001_0001, "Invalid argument"),
        (POLL_TIMEOUT, 0x0001_0002, "Bounded poll exceeded its deadline"),
        (
            RESOLVER_ENGINE_NOT_FOUND,
            0x0002_0001,
            "Descriptor Resolver Error: Engine not present in the chip tables"
        ),
        (
            RESOLVER_INVALID_INSTANCE,
            0x0002_0002,
            "Descriptor Resolver Error: Instance index out of range for engine"
        ),
        (
            RESOLVER_INVALID_INDEX_MASK,
            0x0002_0003,
            "Descriptor Resolver Error: Index mask selects no valid instance"
        ),
        (
            RESOLVER_NO_SOURCE_ID,
            0x0002_0004,
            "Descriptor Resolver Error: Engine has no priv source identifier"
        ),
        (
            ISOLATION_SELF_ISOLATION_REJECTED,
            0x0003_0001,
            "Isolation Error: An engine cannot isolate itself"
        ),
        (
            ISOLATION_PERMISSION_DENIED,
            0x0003_0002,
            "Isolation Error: Source is not enabled in the isolation PLM"
        ),
        (
            ISOLATION_UNKNOWN_CLUSTER,
            0x0003_0003,
            "Isolation Error: Descriptor names an isolation cluster the chip does not have"
        ),
        (
            ISOLATION_INVALID_SOURCE_ID,
            0x0003_0004,
            "Isolation Error: Source identifier does not fit the target mask"
        ),
        (
            RESET_INVALID_RESET_ADDRESS,
            0x0004_0001,
            "Reset Error: Engine has neither a secure reset register nor a legacy enable bit"
        ),
        (
            RESET_CORE_SELECT_MISMATCH,
            0x0004_0002,
            "Reset Error: Hardware core select disagrees with the declared core type"
        ),
        (
            RESET_KEY_FETCH_STUCK,
            0x0004_0003,
            "Reset Error: Secure key fetch still in flight after its bound"
        ),
        (
            RESET_KEY_FETCH_FAILED,
            0x0004_0004,
            "Reset Error: Secure key fetch reported failure"
        ),
        (
            LOADER_MISALIGNED_TRANSFER,
            0x0005_0001,
            "Loader Error: Transfer size or offset is not block aligned"
        ),
        (
            LOADER_INVALID_SECURE_BLOCK_REQUEST,
            0x0005_0002,
            "Loader Error: Secure blocks may only target instruction memory"
        ),
        (
            LOADER_IMAGE_TOO_LARGE,
            0x0005_0003,
            "Loader Error: Image does not fit the target memory"
        ),
        (
            LOADER_SIGNATURE_REJECTED,
            0x0005_0004,
            "Loader Error: Bundled application image failed signature verification"
        ),
        (
            LOADER_WPR_READ_FAILED,
            0x0005_0005,
            "Loader Error: WPR bytes could not be read for port transfer"
        ),
        (
            AUTH_NOT_HALTED,
            0x0006_0001,
            "Authorizer Error: Target was not halted before authorization"
        ),
        (
            AUTH_REJECTED,
            0x0006_0002,
            "Authorizer Error: Hardware refused the LS transition"
        ),
        (
            AUTH_FINAL_PLMS_ALREADY_APPLIED,
            0x0006_0003,
            "Authorizer Error: Final PLMs were already written for this attempt"
        ),
        (
            BOOTSTRAP_TOO_MANY_TARGETS,
            0x0007_0001,
            "Bootstrap Error: Header list exceeds the outcome capacity"
        ),
        (
            BOOTSTRAP_HEADER_NOT_FOUND,
            0x0007_0002,
            "Bootstrap Error: No firmware header for the requested engine"
        ),
    ];

    /// Returns true for conditions that must halt the source instead of being reported.
    pub fn is_fatal(&self) -> bool {
        *self == Self::RESET_KEY_FETCH_STUCK || *self == Self::RESET_KEY_FETCH_FAILED
    }

    /// Component identifier held in the upper half of the code.
    pub fn component(&self) -> u16 {
        (self.0.get() >> 16) as u16
    }
}

impl From<core::num::NonZeroU32> for crate::LsBootError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::LsBootError(val)
    }
}

impl From<LsBootError> for core::num::NonZeroU32 {
    fn from(val: LsBootError) -> Self {
        val.0
    }
}

impl From<LsBootError> for u32 {
    fn from(val: LsBootError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for LsBootError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(LsBootError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type BootResult<T> = Result<T, LsBootError>;
