//! Architecture selection.
//!
//! [`PlatformIrq`] is the interrupt masking implementation for the target
//! being built. Hosted builds (unit tests, simulators) get [`NoIrq`], which
//! leaves the interrupt state untouched.
//!
//! [`NoIrq`]: crate::sync::irq::NoIrq

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm;
        pub use arm::irq::ArmIrq as PlatformIrq;
    } else {
        pub use crate::sync::irq::NoIrq as PlatformIrq;
    }
}
