//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines the interfaces an SPI controller driver sits between:
//! the bus framework above it and the clock, pin and interrupt services of
//! the platform below it.
//!
//! # Available Interfaces
//!
//! - [`spi`]: SPI devices, transfers and the controller operations
//! - [`clock`]: Peripheral clock gating
//! - [`pinctrl`]: Pin multiplexing states
//! - [`interrupt`]: Interrupt handler registration
//! - [`pm`]: Runtime and system power management

pub mod clock;
pub mod interrupt;
pub mod pinctrl;
pub mod pm;
pub mod spi;
