//! Typed access to the USART register block.

use crate::hw::at91_usart::{
    BRGR_OFFSET, CR_OFFSET, CSR_OFFSET, Control, IDR_OFFSET, IER_OFFSET, MR_OFFSET, Mode,
    RHR_OFFSET, Status, THR_OFFSET, VERSION_OFFSET,
};
use crate::hw::mmio::RegisterBus;

/// One accessor per register, each a single access of the register's width.
pub(super) struct UsartRegs<B> {
    bus: B,
}

impl<B: RegisterBus> UsartRegs<B> {
    pub(super) fn new(bus: B) -> Self {
        Self { bus }
    }

    #[inline]
    pub(super) fn control(&self, bits: Control) {
        self.bus.write32(CR_OFFSET, bits.bits());
    }

    #[inline]
    pub(super) fn set_mode(&self, mode: Mode) {
        self.bus.write32(MR_OFFSET, mode.bits());
    }

    #[inline]
    pub(super) fn enable_irqs(&self, sources: Status) {
        self.bus.write32(IER_OFFSET, sources.bits());
    }

    #[inline]
    pub(super) fn disable_irqs(&self, sources: Status) {
        self.bus.write32(IDR_OFFSET, sources.bits());
    }

    #[inline]
    pub(super) fn status(&self) -> Status {
        Status::from_bits_retain(self.bus.read32(CSR_OFFSET))
    }

    #[inline]
    pub(super) fn read_rx(&self) -> u8 {
        self.bus.read8(RHR_OFFSET)
    }

    #[inline]
    pub(super) fn write_tx(&self, byte: u8) {
        self.bus.write8(THR_OFFSET, byte);
    }

    #[inline]
    pub(super) fn set_divisor(&self, divisor: u32) {
        self.bus.write32(BRGR_OFFSET, divisor);
    }

    #[inline]
    pub(super) fn version(&self) -> u32 {
        self.bus.read32(VERSION_OFFSET)
    }
}
