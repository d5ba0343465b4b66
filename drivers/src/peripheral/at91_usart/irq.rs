//! Interrupt side of the transfer engine.

use core::sync::atomic::Ordering;

use super::UsartSpi;
use crate::hal::clock::Clock;
use crate::hal::interrupt::{InterruptHandler, IrqNumber, IrqReturn};
use crate::hal::pinctrl::PinControl;
use crate::hw::at91_usart::{OVRE_RXRDY_IRQS, Status};
use crate::hw::mmio::RegisterBus;

impl<B, C, P> UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    /// Service one interrupt from this USART.
    ///
    /// An overrun fails the transfer in flight and masks both sources until
    /// the next message. Otherwise one received byte is stored, provided a
    /// transfer is still waiting for it.
    pub fn handle_interrupt(&self) -> IrqReturn {
        let shared = self.shared.lock_in_irq();
        let status = self.read_status();

        if status.contains(Status::OVRE) {
            self.xfer_failed.store(true, Ordering::Release);
            self.regs.disable_irqs(OVRE_RXRDY_IRQS);
            return IrqReturn::Handled;
        }

        if !status.contains(Status::RXRDY) {
            return IrqReturn::None;
        }

        let Some(xfer) = shared.current.as_ref() else {
            return IrqReturn::None;
        };
        let remaining = self.rx_remaining.load(Ordering::Relaxed);
        if remaining == 0 {
            return IrqReturn::None;
        }

        let byte = self.regs.read_rx();
        xfer.store(xfer.len() - remaining, byte);
        self.rx_remaining.store(remaining - 1, Ordering::Release);

        IrqReturn::Handled
    }
}

impl<B, C, P> InterruptHandler for UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    fn handle_irq(&self, _irq: IrqNumber) -> IrqReturn {
        self.handle_interrupt()
    }
}
