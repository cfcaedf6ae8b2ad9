/*++

Licensed under the Apache-2.0 license.

File Name:

    uart.rs

Abstract:

    File contains API for accessing the emulator debug UART

--*/

use crate::mmio::{MmioMut, RealMmio};

/// Transmit register of the emulator debug UART.
const EMU_UART_TX: usize = 0x0000_1000;

/// Emulator debug UART
#[derive(Default, Debug)]
pub struct Uart {}

impl Uart {
    /// Create an instance of the UART
    pub fn new() -> Self {
        Self {}
    }

    /// Write the string to UART
    ///
    /// # Arguments
    ///
    /// `str` - String to write to UART
    pub fn write(&mut self, str: &str) {
        for byte in str.bytes() {
            match byte {
                0x20..=0x7e | b'\n' | b'\t' => self.write_byte(byte),
                _ => self.write_byte(0xfe),
            }
        }
    }

    /// Write the byte to UART
    ///
    /// # Arguments
    ///
    /// `byte` - Byte to write to UART
    pub fn write_byte(&mut self, byte: u8) {
        // SAFETY: the emulator maps its debug UART transmit register at this address.
        let uart = unsafe { RealMmio::new(EMU_UART_TX) };
        uart.write(0, byte as u32);
    }
}
