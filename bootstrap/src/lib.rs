/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Light-Secure bootstrap library.

--*/

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod boot_status;
mod config;
mod env;
mod flow;
mod header;
mod outcome;

pub use boot_status::LsBootStatus;
pub use config::{BootConfig, BootProfile, Platform};
pub use env::BootEnv;
pub use flow::Bootstrap;
pub use header::{
    BootFlags, FirmwareHeader, FirmwareVerifier, ImageSection, SourceHalt, WprHeaderAccessor,
};
pub use outcome::{
    BootStage, BootstrapOutcome, OutcomeList, TargetOutcome, TargetState, MAX_TARGETS,
};
