//! Raw hardware definitions: register access and register maps.

pub mod at91_usart;
pub mod mmio;
