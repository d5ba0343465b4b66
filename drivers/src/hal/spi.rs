//! SPI Bus Hardware Abstraction Layer.
//!
//! This module defines the platform-independent side of an SPI master: the
//! devices attached to a bus, the transfers issued to them, and the
//! operations a bus framework calls on a controller driver.

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// SPI device mode bits.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct SpiMode: u16 {
        /// Clock phase: sample on the trailing edge.
        const CPHA = 0x01;
        /// Clock polarity: clock idles high.
        const CPOL = 0x02;
        /// Chip select is active high.
        const CS_HIGH = 0x04;
        /// Least significant bit first.
        const LSB_FIRST = 0x08;
        /// MOSI and MISO share one wire.
        const THREE_WIRE = 0x10;
        /// Controller loops MOSI back to MISO.
        const LOOP = 0x20;

        const MODE_0 = 0;
        const MODE_1 = Self::CPHA.bits();
        const MODE_2 = Self::CPOL.bits();
        const MODE_3 = Self::CPOL.bits() | Self::CPHA.bits();
    }
}

/// SPI errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpiError {
    /// Requested bits per word are not supported by the controller.
    UnsupportedWordSize(u8),
    /// Requested mode bits are not supported by the controller.
    UnsupportedMode(u16),
    /// Device has no controller state; `setup` was never called.
    NotConfigured,
    /// Transmit and receive buffers differ in length.
    LengthMismatch,
    /// A received byte was lost before it could be read.
    Overrun,
    /// The controller stopped making progress on a transfer.
    Timeout,
    /// A transfer is in flight.
    Busy,
    /// The controller is powered down.
    Suspended,
    /// Input clock is missing or unusable.
    ClockUnavailable,
    /// A platform resource (registers, interrupt line) is missing.
    ResourceUnavailable,
    /// The input clock could not be re-enabled on resume.
    ClockReenableFailed,
    /// The bus framework's message queue refused to stop or start.
    Queue,
}

impl SpiError {
    /// Whether this error aborted a transfer in progress.
    ///
    /// Bus frameworks report these to the transfer issuer as I/O errors.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, Self::Overrun | Self::Timeout)
    }
}

impl fmt::Display for SpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedWordSize(bits) => write!(f, "unsupported word size: {} bits", bits),
            Self::UnsupportedMode(mode) => write!(f, "unsupported mode bits: {:#06x}", mode),
            Self::NotConfigured => write!(f, "device not set up"),
            Self::LengthMismatch => write!(f, "tx and rx buffer lengths differ"),
            Self::Overrun => write!(f, "receive overrun"),
            Self::Timeout => write!(f, "transfer timed out"),
            Self::Busy => write!(f, "transfer in progress"),
            Self::Suspended => write!(f, "controller suspended"),
            Self::ClockUnavailable => write!(f, "clock unavailable"),
            Self::ResourceUnavailable => write!(f, "resource unavailable"),
            Self::ClockReenableFailed => write!(f, "clock re-enable failed"),
            Self::Queue => write!(f, "message queue error"),
        }
    }
}

/// A device attached to an SPI bus.
///
/// `S` is the controller driver's per-device state. It is created by
/// [`SpiController::setup`] and released by [`SpiController::cleanup`].
#[derive(Debug)]
pub struct SpiDevice<S> {
    pub chip_select: u8,
    pub mode: SpiMode,
    pub bits_per_word: u8,
    pub max_speed_hz: u32,
    state: Option<S>,
}

impl<S> SpiDevice<S> {
    /// Create a mode 0, 8-bit device on the given chip select.
    pub const fn new(chip_select: u8) -> Self {
        Self {
            chip_select,
            mode: SpiMode::MODE_0,
            bits_per_word: 8,
            max_speed_hz: 0,
            state: None,
        }
    }

    pub const fn with_mode(mut self, mode: SpiMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn with_bits_per_word(mut self, bits: u8) -> Self {
        self.bits_per_word = bits;
        self
    }

    pub const fn with_max_speed_hz(mut self, hz: u32) -> Self {
        self.max_speed_hz = hz;
        self
    }

    /// Controller state, if the device has been set up.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    /// Controller state slot, creating it with `init` on first use.
    pub fn state_or_insert_with(&mut self, init: impl FnOnce() -> S) -> &mut S {
        self.state.get_or_insert_with(init)
    }

    /// Remove and return the controller state.
    pub fn take_state(&mut self) -> Option<S> {
        self.state.take()
    }
}

/// One full-duplex transfer.
///
/// Both buffers are borrowed for the duration of a single
/// [`SpiController::transfer_one`] call and have the same length.
#[derive(Debug)]
pub struct SpiTransfer<'a> {
    tx_buf: &'a [u8],
    rx_buf: &'a mut [u8],
    /// Clock speed for this transfer. Zero selects the controller maximum.
    pub speed_hz: u32,
}

impl<'a> SpiTransfer<'a> {
    /// Pair a transmit and a receive buffer of equal length.
    pub fn new(tx_buf: &'a [u8], rx_buf: &'a mut [u8], speed_hz: u32) -> Result<Self, SpiError> {
        if tx_buf.len() != rx_buf.len() {
            return Err(SpiError::LengthMismatch);
        }

        Ok(Self {
            tx_buf,
            rx_buf,
            speed_hz,
        })
    }

    pub fn len(&self) -> usize {
        self.tx_buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx_buf.is_empty()
    }

    /// Split into the transmit buffer and the receive buffer.
    pub fn buffers_mut(&mut self) -> (&[u8], &mut [u8]) {
        (self.tx_buf, &mut *self.rx_buf)
    }
}

/// Static description of what a controller supports.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControllerCaps {
    /// Mode bits accepted by `setup`.
    pub mode_bits: SpiMode,
    /// Bit `n - 1` is set when `n` bits per word are supported.
    pub bits_per_word_mask: u32,
    /// Transfers must carry a transmit buffer.
    pub must_tx: bool,
    /// Transfers must carry a receive buffer.
    pub must_rx: bool,
    pub min_speed_hz: u32,
    pub max_speed_hz: u32,
}

impl ControllerCaps {
    pub fn supports_word_size(&self, bits: u8) -> bool {
        (1..=32).contains(&bits) && self.bits_per_word_mask & (1 << (bits - 1)) != 0
    }
}

/// Operations a bus framework calls on an SPI controller driver.
pub trait SpiController {
    /// Per-device state cached in [`SpiDevice`].
    type DeviceState;

    /// Validate the device's mode and word size and cache the result.
    fn setup(&self, spi: &mut SpiDevice<Self::DeviceState>) -> Result<(), SpiError>;

    /// Bring the hardware into the device's configuration before a message.
    fn prepare_message(&self, spi: &SpiDevice<Self::DeviceState>) -> Result<(), SpiError>;

    /// Run one transfer to completion (blocking).
    fn transfer_one(
        &self,
        spi: &SpiDevice<Self::DeviceState>,
        xfer: &mut SpiTransfer<'_>,
    ) -> Result<(), SpiError>;

    /// Quiesce the hardware after a message.
    fn unprepare_message(&self, spi: &SpiDevice<Self::DeviceState>) -> Result<(), SpiError>;

    /// Release the device's cached state.
    fn cleanup(&self, spi: &mut SpiDevice<Self::DeviceState>);

    /// Run a message: prepare, every transfer in order, then unprepare.
    ///
    /// Unprepare always runs. The first error is returned.
    fn transfer_message(
        &self,
        spi: &SpiDevice<Self::DeviceState>,
        transfers: &mut [SpiTransfer<'_>],
    ) -> Result<(), SpiError> {
        self.prepare_message(spi)?;

        let mut result = Ok(());
        for xfer in transfers.iter_mut() {
            result = self.transfer_one(spi, xfer);
            if result.is_err() {
                break;
            }
        }

        let unprepared = self.unprepare_message(spi);
        result.and(unprepared)
    }
}

/// The bus framework's message queue, as seen by a controller driver
/// during system sleep.
pub trait SpiMessageQueue {
    /// Stop accepting messages and wait for the one in flight to finish.
    fn suspend(&self) -> Result<(), SpiError>;

    /// Start processing messages again.
    fn resume(&self) -> Result<(), SpiError>;
}
