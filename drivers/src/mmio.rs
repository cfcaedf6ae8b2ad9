/*++

Licensed under the Apache-2.0 license.

File Name:

    mmio.rs

Abstract:

    File contains the traits used to access engine and chip registers.

--*/

/// Read access to the priv register space.
///
/// Addresses are absolute priv addresses; register blocks add their own offsets to the bases
/// carried in an `EngineDescriptor`.
pub trait Mmio {
    /// Loads the 32-bit register at `addr`.
    fn read(&self, addr: u32) -> u32;
}

/// Write access to the priv register space.
///
/// Writes take `&self` so that several drivers can share one bus while a bootstrap attempt is in
/// flight; the bus itself performs no locking.
pub trait MmioMut: Mmio {
    /// Stores `val` to the 32-bit register at `addr`.
    fn write(&self, addr: u32, val: u32);

    /// Read-modify-write helper.
    fn modify(&self, addr: u32, f: impl FnOnce(u32) -> u32) {
        let val = self.read(addr);
        self.write(addr, f(val));
    }
}

impl<T: Mmio + ?Sized> Mmio for &T {
    fn read(&self, addr: u32) -> u32 {
        (**self).read(addr)
    }
}

impl<T: MmioMut + ?Sized> MmioMut for &T {
    fn write(&self, addr: u32, val: u32) {
        (**self).write(addr, val)
    }
}

/// MMIO implementation that performs volatile loads and stores against the physical priv
/// aperture mapped at `base`.
#[derive(Clone, Copy, Debug)]
pub struct RealMmio {
    base: usize,
}

impl RealMmio {
    /// Create a new `RealMmio`.
    ///
    /// # Safety
    ///
    /// `base` must be the start of the priv aperture, mapped for the lifetime of the returned
    /// value, and every address handed to `read`/`write` must be a valid 32-bit aligned register
    /// offset within it. Callers must not create aliasing instances that race each other.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn ptr(&self, addr: u32) -> *mut u32 {
        (self.base + addr as usize) as *mut u32
    }
}

impl Mmio for RealMmio {
    fn read(&self, addr: u32) -> u32 {
        // SAFETY: the constructor contract guarantees the aperture is mapped.
        unsafe { core::ptr::read_volatile(self.ptr(addr)) }
    }
}

impl MmioMut for RealMmio {
    fn write(&self, addr: u32, val: u32) {
        // SAFETY: the constructor contract guarantees the aperture is mapped.
        unsafe { core::ptr::write_volatile(self.ptr(addr), val) }
    }
}
