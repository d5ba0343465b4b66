//! Peripheral Clock Hardware Abstraction Layer.

/// Clock framework errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The clock (or one of its parents) failed to start.
    EnableFailed,
}

/// A gateable peripheral clock.
///
/// Enables are reference counted: the clock runs while more enables than
/// disables have been issued.
pub trait Clock: Send + Sync {
    /// Prepare and enable the clock.
    fn enable(&self) -> Result<(), ClockError>;

    /// Drop one enable reference.
    fn disable(&self);

    /// Current output rate in Hz. Zero if unknown.
    fn rate_hz(&self) -> u32;
}
