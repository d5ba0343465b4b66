//! USART SPI Controller Driver
//!
//! This crate drives an AT91 USART as an SPI bus master, layered the same
//! way as the rest of the driver tree:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`hw`]: Register access and register maps
//! - [`platform`]: Resource description handed to a driver at probe
//! - [`peripheral`]: The controller driver itself
//! - [`irq_registry`]: Interrupt line to handler dispatch
//!
//! # Usage Example
//!
//! ```ignore
//! use usart_spi::{SpiController, SpiDevice, SpiTransfer, UsartSpi, UsartSpiConfig};
//! use usart_spi::irq_registry::irq_registry;
//!
//! let ctrl = UsartSpi::probe(&mut board_usart1, irq_registry(), UsartSpiConfig::new())?;
//!
//! let mut dev = SpiDevice::new(0);
//! ctrl.setup(&mut dev)?;
//!
//! let mut rx = [0u8; 2];
//! let mut xfer = SpiTransfer::new(&[0x05, 0x00], &mut rx, 1_000_000)?;
//! ctrl.transfer_message(&dev, core::slice::from_mut(&mut xfer))?;
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod hal;
pub mod hw;
pub mod irq_registry;
pub mod peripheral;
pub mod platform;

// Re-export commonly used types
pub use hal::interrupt::{InterruptHandler, IrqReturn};
pub use hal::pm::{PowerManaged, PowerState};
pub use hal::spi::{SpiController, SpiDevice, SpiError, SpiMode, SpiTransfer};
pub use peripheral::at91_usart::{UsartSpi, UsartSpiConfig};
