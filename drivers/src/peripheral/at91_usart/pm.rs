//! Runtime and system power management.

use super::UsartSpi;
use crate::hal::clock::Clock;
use crate::hal::pinctrl::{PinControl, PinState};
use crate::hal::pm::{PowerManaged, PowerState};
use crate::hal::spi::{SpiError, SpiMessageQueue};
use crate::hw::mmio::RegisterBus;

impl<B, C, P> UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    fn gate(&self) {
        self.clock.disable();
        if let Err(err) = self.pins.select(PinState::Sleep) {
            log::warn!("irq {}: sleep pin state not applied: {:?}", self.irq, err);
        }
    }

    fn ungate(&self) -> Result<(), SpiError> {
        if let Err(err) = self.pins.select(PinState::Default) {
            log::warn!("irq {}: default pin state not applied: {:?}", self.irq, err);
        }
        self.clock.enable().map_err(|err| {
            log::error!("irq {}: clock re-enable failed: {:?}", self.irq, err);
            SpiError::ClockReenableFailed
        })
    }
}

impl<B, C, P> PowerManaged for UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    fn runtime_suspend(&self) -> Result<(), SpiError> {
        let mut power = self.power.lock();
        if *power != PowerState::Active {
            return Ok(());
        }
        if self.in_flight() {
            return Err(SpiError::Busy);
        }

        self.gate();
        *power = PowerState::RuntimeSuspended;
        log::trace!("irq {}: runtime suspended", self.irq);

        Ok(())
    }

    fn runtime_resume(&self) -> Result<(), SpiError> {
        let mut power = self.power.lock();
        match *power {
            PowerState::Active => return Ok(()),
            PowerState::SystemSuspended { .. } => return Err(SpiError::Suspended),
            PowerState::RuntimeSuspended => {}
        }

        self.ungate()?;
        *power = PowerState::Active;
        log::trace!("irq {}: runtime resumed", self.irq);

        Ok(())
    }

    fn suspend(&self, queue: &dyn SpiMessageQueue) -> Result<(), SpiError> {
        queue.suspend()?;

        let mut power = self.power.lock();
        let resume_clock = match *power {
            PowerState::Active => {
                self.gate();
                true
            }
            PowerState::RuntimeSuspended => false,
            PowerState::SystemSuspended { .. } => return Ok(()),
        };
        *power = PowerState::SystemSuspended { resume_clock };
        log::trace!("irq {}: suspended (clock gated here: {})", self.irq, resume_clock);

        Ok(())
    }

    fn resume(&self, queue: &dyn SpiMessageQueue) -> Result<(), SpiError> {
        {
            let mut power = self.power.lock();
            let PowerState::SystemSuspended { resume_clock } = *power else {
                return Ok(());
            };

            if resume_clock {
                self.ungate()?;
                *power = PowerState::Active;
            } else {
                *power = PowerState::RuntimeSuspended;
            }
        }

        // register contents do not survive system sleep
        self.init();
        log::trace!("irq {}: resumed", self.irq);

        queue.resume()
    }
}
