//! Power Management Abstraction Layer.

use super::spi::{SpiError, SpiMessageQueue};

/// Power state of a controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerState {
    /// Clock running, peripheral initialised.
    Active,
    /// Clock gated, pins in their sleep state.
    RuntimeSuspended,
    /// Whole-system sleep.
    SystemSuspended {
        /// The system transition gated the clock itself and must restart it.
        resume_clock: bool,
    },
}

/// Runtime and system sleep transitions of a bus controller.
pub trait PowerManaged {
    /// Gate the clock while idle.
    fn runtime_suspend(&self) -> Result<(), SpiError>;

    /// Undo [`runtime_suspend`](Self::runtime_suspend).
    fn runtime_resume(&self) -> Result<(), SpiError>;

    /// Quiesce `queue`, then power down for system sleep.
    fn suspend(&self, queue: &dyn SpiMessageQueue) -> Result<(), SpiError>;

    /// Power up and re-initialise after system sleep, then restart `queue`.
    fn resume(&self, queue: &dyn SpiMessageQueue) -> Result<(), SpiError>;
}
