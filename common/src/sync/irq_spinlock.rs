use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

use super::irq::IrqControl;

/// IRQ-safe spinlock.
///
/// Data shared between a driver's calling context and its interrupt handler
/// lives behind one of these. The two sides acquire it differently:
///
/// - [`lock`](Self::lock) masks local interrupts before spinning, so the
///   handler can never preempt the holder on the same core and deadlock.
/// - [`lock_in_irq`](Self::lock_in_irq) only spins. It is meant for the
///   interrupt handler itself, which already runs with its line masked.
///
/// Not fair. Not reentrant.
pub struct IrqSpinLock<T, I: IrqControl> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
    _irq: PhantomData<I>,
}

unsafe impl<T: Send, I: IrqControl> Send for IrqSpinLock<T, I> {}
unsafe impl<T: Send, I: IrqControl> Sync for IrqSpinLock<T, I> {}

impl<T, I: IrqControl> IrqSpinLock<T, I> {
    /// Create a new IRQ-safe spinlock.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
            _irq: PhantomData,
        }
    }

    /// Acquire the lock from thread context, with interrupts disabled.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T, I> {
        let irq_state = I::disable();
        self.acquire();

        IrqSpinLockGuard {
            lock: self,
            irq_state: Some(irq_state),
        }
    }

    /// Acquire the lock from interrupt context.
    ///
    /// The interrupt state is left alone and not restored on drop.
    pub fn lock_in_irq(&self) -> IrqSpinLockGuard<'_, T, I> {
        self.acquire();

        IrqSpinLockGuard {
            lock: self,
            irq_state: None,
        }
    }

    /// Try to acquire the lock once, with interrupts disabled on success.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T, I>> {
        let irq_state = I::disable();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(IrqSpinLockGuard {
                lock: self,
                irq_state: Some(irq_state),
            })
        } else {
            I::restore(irq_state);
            None
        }
    }

    fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }
}

/// Guard returned by the `IrqSpinLock` acquisition methods.
///
/// Releases the lock on drop, then restores the interrupt state if the
/// guard came from [`IrqSpinLock::lock`] or [`IrqSpinLock::try_lock`].
pub struct IrqSpinLockGuard<'a, T, I: IrqControl> {
    lock: &'a IrqSpinLock<T, I>,
    irq_state: Option<I::State>,
}

impl<'a, T, I: IrqControl> core::ops::Deref for IrqSpinLockGuard<'a, T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T, I: IrqControl> core::ops::DerefMut for IrqSpinLockGuard<'a, T, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T, I: IrqControl> Drop for IrqSpinLockGuard<'a, T, I> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);

        if let Some(state) = self.irq_state {
            I::restore(state);
        }
    }
}
