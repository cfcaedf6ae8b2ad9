/*++

Licensed under the Apache-2.0 license.

File Name:

    status.rs

Abstract:

    File contains API for reporting boot progress and errors through the chip scratch
    registers.

--*/

use crate::descriptor::ChipGlobals;
use crate::mmio::MmioMut;

/// Writes progress and error codes to the registers named by the chip globals. Registers the
/// chip does not provide are skipped.
pub struct StatusReporter<'a, M: MmioMut> {
    mmio: &'a M,
    globals: ChipGlobals,
}

impl<'a, M: MmioMut> StatusReporter<'a, M> {
    pub fn new(mmio: &'a M, globals: &ChipGlobals) -> Self {
        Self {
            mmio,
            globals: *globals,
        }
    }

    fn write(&self, addr: u32, val: u32) {
        if addr != 0 {
            self.mmio.write(addr, val);
        }
    }

    /// Report boot status
    ///
    /// # Arguments
    ///
    /// * `val` - Boot status code.
    pub fn report_boot_status(&self, val: u32) {
        self.write(self.globals.boot_status, val);
    }

    /// Report non fatal error
    ///
    /// # Arguments
    ///
    /// * `val` - Error code.
    pub fn report_error_non_fatal(&self, val: u32) {
        self.write(self.globals.error_non_fatal, val);
    }

    /// Report fatal error
    ///
    /// # Arguments
    ///
    /// * `val` - Error code.
    pub fn report_error_fatal(&self, val: u32) {
        self.write(self.globals.error_fatal, val);
    }
}
