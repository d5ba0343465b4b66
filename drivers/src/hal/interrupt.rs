//! Interrupt Handling Hardware Abstraction Layer.
//!
//! This module defines the contract between a device driver's interrupt
//! handler and whatever dispatches interrupts to it.

/// Interrupt number type.
pub type IrqNumber = u32;

/// Result of running an interrupt handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqReturn {
    /// The interrupt was not raised by this device.
    None,
    /// The device raised the interrupt and it was serviced.
    Handled,
}

impl IrqReturn {
    pub fn is_handled(self) -> bool {
        matches!(self, IrqReturn::Handled)
    }
}

/// A device's interrupt service routine.
///
/// Runs in interrupt context: it must not block, and it may run
/// concurrently with the device's other methods on another core.
pub trait InterruptHandler: Send + Sync {
    fn handle_irq(&self, irq: IrqNumber) -> IrqReturn;
}
