//! Platform Resource Interface
//!
//! A controller driver does not discover its own resources. Whatever
//! enumerates the platform (device tree, board tables) hands each driver
//! instance a [`PlatformDevice`] describing its register window, interrupt
//! line, clocks and pins.
//!
//! # Usage
//!
//! ```ignore
//! let ctrl = UsartSpi::probe(&mut board_usart1, irq_registry(), UsartSpiConfig::new())?;
//! ```

use crate::hal::clock::Clock;
use crate::hal::interrupt::IrqNumber;
use crate::hal::pinctrl::PinControl;
use crate::hw::mmio::RegisterBus;

/// Resources of one peripheral instance.
///
/// Each accessor hands over ownership; `None` means the resource is not
/// described for this device.
pub trait PlatformDevice {
    type Bus: RegisterBus;
    type Clock: Clock;
    type Pins: PinControl;

    /// Human-readable instance name for diagnostics.
    fn name(&self) -> &str;

    /// Map the device's first register window.
    fn take_registers(&mut self) -> Option<Self::Bus>;

    /// The device's first interrupt line.
    fn irq(&self) -> Option<IrqNumber>;

    /// Look up a clock by its consumer name.
    fn take_clock(&mut self, name: &str) -> Option<Self::Clock>;

    /// The device's pin controller.
    fn take_pins(&mut self) -> Option<Self::Pins>;
}
