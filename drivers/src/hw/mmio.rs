//! Memory-mapped register access.
//!
//! Drivers talk to their register block through [`RegisterBus`] so the same
//! driver code runs against real device memory ([`Mmio`]) and against a
//! simulated register file in tests.

use core::ptr::{read_volatile, write_volatile};

use alloc::sync::Arc;

/// Byte-offset addressed access to a peripheral register window.
///
/// Accesses are relaxed: each is a single volatile load or store of the
/// stated width with no barrier. Callers order accesses explicitly.
pub trait RegisterBus: Send + Sync {
    fn read32(&self, offset: usize) -> u32;
    fn write32(&self, offset: usize, value: u32);
    fn read8(&self, offset: usize) -> u8;
    fn write8(&self, offset: usize, value: u8);
}

/// A register window in device memory.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Wrap a mapped register window.
    ///
    /// # Safety
    ///
    /// - `base` must point to the peripheral's mapped register block
    /// - The mapping must stay valid for the lifetime of this object
    /// - Memory must be mapped as device memory
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }

    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        unsafe { read_volatile((self.base + offset) as *const u8) }
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        unsafe { write_volatile((self.base + offset) as *mut u8, value) }
    }
}

// SAFETY: Mmio wraps memory-mapped hardware; concurrent access is
// coordinated by the driver that owns it.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

impl<T: RegisterBus + ?Sized> RegisterBus for Arc<T> {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value)
    }

    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        (**self).write8(offset, value)
    }
}
