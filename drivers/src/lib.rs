/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the LS bootstrap driver library.

--*/

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod authorizer;
mod descriptor;
mod engine;
mod isolation;
mod loader;
pub mod mmio;
pub mod printer;
pub mod reg;
mod reset;
mod status;
mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use authorizer::{LsAuthorizer, LS_LEVEL};
pub use descriptor::{
    ChipConstants, ChipGlobals, ChipTable, DescriptorResolver, EngineDescriptor, EngineEntry,
    EngineFlags, InstanceEntry, IsolationTarget, KeyFetchRegs, ResetStrategy, SubWprRange,
};
pub use engine::{CoreType, EngineFamily, EngineId, EngineKind};
pub use isolation::{IsolationBypass, IsolationGuard, IsolationProtocol, ReservationToken};
pub use loader::{LoadMethod, MemoryTarget, SecureLoader, Transfer, WprRead};
pub use lsboot_error::{BootResult, LsBootError};
pub use mmio::{Mmio, MmioMut, RealMmio};
pub use printer::HexU32;
pub use reset::{ResetController, ResetState};
pub use status::StatusReporter;
pub use wait::{Poller, Timer, DEFAULT_POLL_TIMEOUT_NS};

cfg_if::cfg_if! {
    if #[cfg(feature = "emu")] {
        mod uart;

        pub use uart::Uart;
    }
}
