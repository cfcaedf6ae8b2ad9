/*++

Licensed under the Apache-2.0 license.

File Name:

    env.rs

Abstract:

    File implements a context holding all the services used by the bootstrap flow.
    The flow only sees hardware through these handles, which keeps it testable against
    fakes.

--*/

use lsboot_drivers::{ChipConstants, MmioMut, Timer};

use crate::header::{FirmwareVerifier, SourceHalt, WprHeaderAccessor};

/// Bootstrap Context
pub struct BootEnv<'a, M: MmioMut> {
    /// Priv bus
    pub mmio: &'a M,

    /// Chip constants of the running generation
    pub chip: &'a dyn ChipConstants,

    /// Timestamp source bounding every poll
    pub timer: &'a dyn Timer,

    /// WPR header and bytes
    pub wpr: &'a dyn WprHeaderAccessor,

    // Signature verifier for bundled application images
    pub verifier: &'a dyn FirmwareVerifier,

    // Called after a fatal error has been reported
    pub halt: &'a dyn SourceHalt,
}
