/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    File contains typed register definitions for the engine and chip register blocks
    touched during bootstrap.

--*/

/// Implements the raw conversions every register value type needs.
macro_rules! impl_raw_reg {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<u32> for $name {
                fn from(val: u32) -> Self {
                    $name(val)
                }
            }

            impl From<$name> for u32 {
                fn from(val: $name) -> u32 {
                    val.0
                }
            }
        )*
    };
}

pub mod falcon;
pub mod isolation;
pub mod plm;
pub mod reset;

use core::marker::PhantomData;

use crate::mmio::{Mmio, MmioMut};

/// A register at a fixed priv address whose value is interpreted as `T`.
pub struct Reg<T> {
    addr: u32,
    _value: PhantomData<T>,
}

impl<T> Clone for Reg<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reg<T> {}

impl<T: From<u32> + Into<u32>> Reg<T> {
    pub const fn new(addr: u32) -> Self {
        Self {
            addr,
            _value: PhantomData,
        }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn read(&self, mmio: &impl Mmio) -> T {
        T::from(mmio.read(self.addr))
    }

    pub fn write(&self, mmio: &impl MmioMut, val: T) {
        mmio.write(self.addr, val.into())
    }

    pub fn modify(&self, mmio: &impl MmioMut, f: impl FnOnce(T) -> T) {
        let val = self.read(mmio);
        self.write(mmio, f(val));
    }
}
