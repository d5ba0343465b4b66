//! Pin Control Hardware Abstraction Layer.

/// Named pin multiplexing state of a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinState {
    /// Pins routed to the peripheral.
    Default,
    /// Low-power configuration while the device is suspended.
    Sleep,
}

/// Pin control errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinctrlError {
    /// The device has no pin configuration for this state.
    NoSuchState,
    /// Applying the state failed.
    Apply,
}

/// Pin state selection for one device.
pub trait PinControl: Send + Sync {
    fn select(&self, state: PinState) -> Result<(), PinctrlError>;
}
