use crate::sync::irq::IrqControl;

/// CPSR I bit: IRQs are masked while set.
const CPSR_I_BIT: u32 = 1 << 7;

/// IRQ masking for ARM cores through the CPSR.
///
/// This is the [`IrqControl`] behind `IrqSpinLock::lock` on ARM builds. A
/// driver's poll path takes its lock with interrupts masked, so the device's
/// own handler can never fire on the same core while the lock is held.
///
/// # State
///
/// `State` is `bool`: whether IRQs were enabled before `disable()`.
/// `restore` only unmasks when they were, so nested critical sections stay
/// masked until the outermost one ends.
///
/// # Assembly
///
/// - `mrs {0}, cpsr`: read the CPSR into a register
/// - `cpsid i`: mask IRQs
/// - `cpsie i`: unmask IRQs
///
/// FIQs are left alone.
pub struct ArmIrq;

impl IrqControl for ArmIrq {
    type State = bool;

    #[inline(always)]
    fn disable() -> bool {
        let cpsr: u32;
        unsafe {
            // Sample the CPSR, then mask
            core::arch::asm!(
                "mrs {0}, cpsr",
                "cpsid i",
                out(reg) cpsr,
                options(nomem, nostack)
            );
        }
        cpsr & CPSR_I_BIT == 0 // true if IRQs were enabled
    }

    #[inline(always)]
    fn restore(prev_enabled: bool) {
        if prev_enabled {
            unsafe {
                core::arch::asm!("cpsie i", options(nomem, nostack));
            }
        }
    }
}
