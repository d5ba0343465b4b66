//! Interrupt handler registry.
//!
//! Every probed controller lives in one slot of the registry, keyed by its
//! interrupt line. The architecture's interrupt entry calls
//! [`IrqRegistry::dispatch`] with the line that fired; the registry hands it
//! to every handler on that line, so several devices can share one line.

use alloc::sync::Arc;
use alloc::vec::Vec;

use common::arch::PlatformIrq;
use common::sync::IrqSpinLock;

use crate::hal::interrupt::{InterruptHandler, IrqNumber, IrqReturn};

/// Index of a registered handler. Stays valid until unregistered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IrqHandle(usize);

struct Slot {
    irq: IrqNumber,
    handler: Arc<dyn InterruptHandler>,
}

pub struct IrqRegistry {
    slots: IrqSpinLock<Vec<Option<Slot>>, PlatformIrq>,
}

impl IrqRegistry {
    pub const fn new() -> Self {
        Self {
            slots: IrqSpinLock::new(Vec::new()),
        }
    }

    /// Attach `handler` to `irq`. Freed slots are reused.
    pub fn register(&self, irq: IrqNumber, handler: Arc<dyn InterruptHandler>) -> IrqHandle {
        let mut slots = self.slots.lock();
        let slot = Some(Slot { irq, handler });

        match slots.iter().position(Option::is_none) {
            Some(index) => {
                slots[index] = slot;
                IrqHandle(index)
            }
            None => {
                slots.push(slot);
                IrqHandle(slots.len() - 1)
            }
        }
    }

    /// Detach a handler. Returns `false` if the handle was already free.
    pub fn unregister(&self, handle: IrqHandle) -> bool {
        let mut slots = self.slots.lock();
        match slots.get_mut(handle.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Run every handler attached to `irq`.
    ///
    /// Returns [`IrqReturn::Handled`] if any of them claimed the interrupt.
    pub fn dispatch(&self, irq: IrqNumber) -> IrqReturn {
        let slots = self.slots.lock_in_irq();
        let mut ret = IrqReturn::None;

        for slot in slots.iter().flatten().filter(|slot| slot.irq == irq) {
            if slot.handler.handle_irq(irq).is_handled() {
                ret = IrqReturn::Handled;
            }
        }

        if !ret.is_handled() {
            log::trace!("irq {}: no handler claimed it", irq);
        }

        ret
    }

    /// Number of handlers attached to `irq`.
    pub fn handlers_on(&self, irq: IrqNumber) -> usize {
        self.slots
            .lock()
            .iter()
            .flatten()
            .filter(|slot| slot.irq == irq)
            .count()
    }
}

impl Default for IrqRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static IRQ_REGISTRY: IrqRegistry = IrqRegistry::new();

/// The system-wide registry used by the interrupt entry path.
pub fn irq_registry() -> &'static IrqRegistry {
    &IRQ_REGISTRY
}
