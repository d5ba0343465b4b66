//! AT91 USART register map, as used in SPI master mode.

use bitflags::bitflags;

// Register offsets
pub const CR_OFFSET: usize = 0x00;
pub const MR_OFFSET: usize = 0x04;
pub const IER_OFFSET: usize = 0x08;
pub const IDR_OFFSET: usize = 0x0C;
pub const CSR_OFFSET: usize = 0x14;
pub const RHR_OFFSET: usize = 0x18;
pub const THR_OFFSET: usize = 0x1C;
pub const BRGR_OFFSET: usize = 0x20;
pub const VERSION_OFFSET: usize = 0xFC;

/// Smallest usable baud-rate-generator divisor.
pub const MIN_CLK_DIV: u32 = 0x06;
/// Exclusive upper bound of the baud-rate-generator divisor.
pub const MAX_CLK_DIV: u32 = 1 << 16;

bitflags! {
    /// Control register (CR) bits. Write-only.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Control: u32 {
        const RSTRX = 1 << 2;
        const RSTTX = 1 << 3;
        const RXEN = 1 << 4;
        const RXDIS = 1 << 5;
        const TXEN = 1 << 6;
        const TXDIS = 1 << 7;

        const RESET = Self::RSTRX.bits() | Self::RSTTX.bits();
        const DISABLE = Self::RXDIS.bits() | Self::TXDIS.bits();
        const ENABLE = Self::RXEN.bits() | Self::TXEN.bits();
    }
}

bitflags! {
    /// Mode register (MR) bits.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Mode: u32 {
        /// USART_MODE field value selecting SPI master.
        const SPI_MASTER = 0x0E;
        /// Character length field, 8 bits.
        const CHRL_8 = 0b11 << 6;
        const CPHA = 1 << 8;
        const LOOP = 1 << 15;
        const CPOL = 1 << 16;
        const CLKO = 1 << 18;
        /// Wait for RHR to be read before transmitting the next character.
        const WRDBT = 1 << 20;
    }
}

/// Mode register value written at initialisation. Every device
/// configuration is composed on top of it.
pub const MODE_INIT: Mode = Mode::SPI_MASTER
    .union(Mode::CHRL_8)
    .union(Mode::CLKO)
    .union(Mode::WRDBT);

bitflags! {
    /// Channel status (CSR) bits, shared with IER/IDR/IMR.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Status: u32 {
        const RXRDY = 1 << 0;
        const TXRDY = 1 << 1;
        const OVRE = 1 << 5;

        const _ = !0;
    }
}

/// Interrupt sources armed while a message is in progress.
pub const OVRE_RXRDY_IRQS: Status = Status::OVRE.union(Status::RXRDY);
