//! Peripheral Drivers
//!
//! # Available Peripherals
//!
//! - [`at91_usart`]: AT91 USART in SPI master mode

pub mod at91_usart;
