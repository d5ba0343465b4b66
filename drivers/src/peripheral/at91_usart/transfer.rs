//! Transfer engine: busy-polled transmit against interrupt-fed receive.

use core::ptr::NonNull;
use core::sync::atomic::Ordering;

use super::{DeviceConfig, UsartSpi, clock_divisor};
use crate::hal::clock::Clock;
use crate::hal::pinctrl::PinControl;
use crate::hal::pm::PowerState;
use crate::hal::spi::{SpiDevice, SpiError, SpiTransfer};
use crate::hw::at91_usart::{MAX_CLK_DIV, MIN_CLK_DIV, Status};
use crate::hw::mmio::RegisterBus;

/// Receive buffer of the transfer in flight, as seen by the interrupt
/// handler.
///
/// Only created from a `&mut [u8]` that `run_transfer` keeps borrowed, and
/// always dropped before `run_transfer` returns.
pub(super) struct ActiveTransfer {
    rx: NonNull<u8>,
    len: usize,
}

// SAFETY: the pointer is only dereferenced under `UsartSpi::shared`, while
// the borrow it was taken from is alive.
unsafe impl Send for ActiveTransfer {}

impl ActiveTransfer {
    fn bind(rx: &mut [u8]) -> Self {
        Self {
            len: rx.len(),
            rx: NonNull::from(rx).cast(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.len
    }

    /// Write one received byte.
    pub(super) fn store(&self, index: usize, byte: u8) {
        assert!(index < self.len);
        // SAFETY: in bounds, and the buffer is exclusively ours until unbound
        unsafe { self.rx.as_ptr().add(index).write(byte) }
    }
}

impl<B, C, P> UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    /// Run one full-duplex transfer.
    ///
    /// Blocks until every byte has been sent and received, the interrupt
    /// handler reports an overrun, or the poll loop stalls past the
    /// configured limit.
    pub fn run_transfer(
        &self,
        spi: &SpiDevice<DeviceConfig>,
        xfer: &mut SpiTransfer<'_>,
    ) -> Result<(), SpiError> {
        let len = xfer.len();
        let divisor = clock_divisor(self.spi_clk, xfer.speed_hz);
        debug_assert!(
            (MIN_CLK_DIV..MAX_CLK_DIV).contains(&divisor),
            "divisor {} out of range for {} Hz",
            divisor,
            xfer.speed_hz
        );

        let (tx, rx) = xfer.buffers_mut();

        {
            // power stays locked until the buffer is bound; runtime_suspend
            // looks at both under it
            let power = self.power.lock();
            if *power != PowerState::Active {
                return Err(SpiError::Suspended);
            }

            self.regs.set_divisor(divisor);
            self.xfer_failed.store(false, Ordering::Release);
            self.tx_remaining.store(len, Ordering::Release);

            let mut shared = self.shared.lock();
            shared.current = Some(ActiveTransfer::bind(rx));
            self.rx_remaining.store(len, Ordering::Release);
        }

        let result = self.pump(tx);

        self.shared.lock().current = None;

        match result {
            Err(SpiError::Overrun) => log::error!(
                "cs{}: overrun, {} of {} bytes not received",
                spi.chip_select,
                self.rx_remaining(),
                len
            ),
            Err(SpiError::Timeout) => log::error!(
                "cs{}: stalled (status {:#x}), tx {} rx {} of {} outstanding",
                spi.chip_select,
                self.last_status().bits(),
                self.tx_remaining(),
                self.rx_remaining(),
                len
            ),
            _ => {}
        }

        result
    }

    /// Feed `tx` into the transmit holding register until both directions
    /// are done.
    fn pump(&self, tx: &[u8]) -> Result<(), SpiError> {
        let len = tx.len();
        let mut progress = (len, len);
        let mut idle: u32 = 0;

        loop {
            let tx_left = self.tx_remaining.load(Ordering::Relaxed);
            let rx_left = self.rx_remaining.load(Ordering::Acquire);

            if self.xfer_failed.load(Ordering::Acquire) {
                return Err(SpiError::Overrun);
            }
            if tx_left == 0 && rx_left == 0 {
                return Ok(());
            }

            let status = self.read_status();
            let mut tx_now = tx_left;
            if tx_left > 0 && status.contains(Status::TXRDY) {
                self.regs.write_tx(tx[len - tx_left]);
                tx_now = tx_left - 1;
                self.tx_remaining.store(tx_now, Ordering::Release);
            }

            if let Some(limit) = self.config.stall_limit {
                if (tx_now, rx_left) == progress {
                    idle += 1;
                    if idle > limit {
                        return Err(SpiError::Timeout);
                    }
                } else {
                    progress = (tx_now, rx_left);
                    idle = 0;
                }
            }

            core::hint::spin_loop();
        }
    }
}
