use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// Implemented by the architecture layer in [`crate::arch`].
pub trait IrqControl {
    /// Saved interrupt state
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    fn restore(state: Self::State);
}

/// Interrupt control for targets without a local interrupt mask.
///
/// Used on hosted builds, where the "interrupt" side of a driver is another
/// thread and mutual exclusion comes from the spinlock alone.
#[derive(Debug, Clone, Copy)]
pub struct NoIrq;

impl IrqControl for NoIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_state: ()) {}
}
