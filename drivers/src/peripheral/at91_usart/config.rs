//! Device configuration: SPI mode requests to mode register values.

use crate::hal::spi::{SpiError, SpiMode};
use crate::hw::at91_usart::{MIN_CLK_DIV, Mode};

/// Mode bits the controller can honour. `CS_HIGH` is accepted but has no
/// register counterpart; chip select is driven outside the USART.
pub const SUPPORTED_MODES: SpiMode = SpiMode::CPOL
    .union(SpiMode::CPHA)
    .union(SpiMode::LOOP)
    .union(SpiMode::CS_HIGH);

/// The only word size the USART supports in SPI mode.
pub const WORD_SIZE: u8 = 8;

/// Cached per-device controller state: the complete mode register value
/// written at the start of every message to the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    mode: Mode,
}

impl DeviceConfig {
    /// Raw mode register value.
    pub fn mode_register(&self) -> u32 {
        self.mode.bits()
    }

    pub(super) fn mode(&self) -> Mode {
        self.mode
    }
}

/// Compose a device's mode register from the controller's fixed bits.
///
/// `base` supplies everything not under per-device control (master mode,
/// character length, clock output, wait-read-before-transmit).
pub fn compose(base: Mode, mode: SpiMode, bits_per_word: u8) -> Result<DeviceConfig, SpiError> {
    if bits_per_word != WORD_SIZE {
        return Err(SpiError::UnsupportedWordSize(bits_per_word));
    }

    let unsupported = mode.difference(SUPPORTED_MODES);
    if !unsupported.is_empty() {
        return Err(SpiError::UnsupportedMode(unsupported.bits()));
    }

    let mut mr = base;
    mr.set(Mode::CPOL, mode.contains(SpiMode::CPOL));
    mr.set(Mode::CPHA, mode.contains(SpiMode::CPHA));
    mr.set(Mode::LOOP, mode.contains(SpiMode::LOOP));

    Ok(DeviceConfig { mode: mr })
}

/// Baud-rate-generator divisor for `speed_hz`: `ceil(input_hz / speed_hz)`.
///
/// A speed of zero asks for the fastest clock, `MIN_CLK_DIV`. The result is
/// only programmable when it lies in `[MIN_CLK_DIV, MAX_CLK_DIV)`; keeping
/// transfer speeds within the controller's advertised range is up to the
/// caller.
pub fn clock_divisor(input_hz: u32, speed_hz: u32) -> u32 {
    if speed_hz == 0 {
        return MIN_CLK_DIV;
    }
    input_hz.div_ceil(speed_hz)
}
