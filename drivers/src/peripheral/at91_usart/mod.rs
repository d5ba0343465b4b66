//! AT91 USART SPI Controller Driver
//!
//! Drives a USART in SPI master mode. The peripheral raises interrupts for
//! received data and overrun only, so the two directions of a transfer run
//! in different contexts:
//!
//! - transmit is busy-polled by the caller of [`UsartSpi::run_transfer`],
//!   one byte per `TXRDY`;
//! - receive is fed by [`UsartSpi::handle_interrupt`], one byte per `RXRDY`.
//!
//! The two sides meet in a handful of atomics and a small IRQ-safe lock
//! around the receive buffer binding. Once a transfer is bound, only the
//! interrupt path writes the receive count and the failure flag, and only
//! the poll path writes the transmit count.
//!
//! # Features
//!
//! - 8-bit words, SPI modes 0-3, internal loopback
//! - Per-transfer clock speed
//! - Overrun detection
//! - Runtime and system power management
//!
//! # Example
//!
//! ```ignore
//! use usart_spi::hal::spi::{SpiController, SpiDevice, SpiMode, SpiTransfer};
//! use usart_spi::irq_registry::irq_registry;
//! use usart_spi::peripheral::at91_usart::{UsartSpi, UsartSpiConfig};
//!
//! let ctrl = UsartSpi::probe(&mut usart1, irq_registry(), UsartSpiConfig::new())?;
//!
//! let mut flash = SpiDevice::new(0).with_mode(SpiMode::MODE_3);
//! ctrl.setup(&mut flash)?;
//!
//! let mut id = [0u8; 4];
//! let mut xfer = SpiTransfer::new(&[0x9f, 0, 0, 0], &mut id, 10_000_000)?;
//! ctrl.transfer_message(&flash, core::slice::from_mut(&mut xfer))?;
//! ```

mod config;
mod irq;
mod pm;
mod regs;
mod transfer;

#[cfg(test)]
pub(crate) mod sim;

pub use config::{DeviceConfig, SUPPORTED_MODES, WORD_SIZE, clock_divisor};

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use alloc::sync::Arc;
use common::arch::PlatformIrq;
use common::sync::IrqSpinLock;

use crate::hal::clock::Clock;
use crate::hal::interrupt::IrqNumber;
use crate::hal::pinctrl::PinControl;
use crate::hal::pm::PowerState;
use crate::hal::spi::{ControllerCaps, SpiController, SpiDevice, SpiError, SpiMode, SpiTransfer};
use crate::hw::at91_usart::{
    Control, MAX_CLK_DIV, MIN_CLK_DIV, MODE_INIT, Mode, OVRE_RXRDY_IRQS, Status,
};
use crate::hw::mmio::RegisterBus;
use crate::irq_registry::{IrqHandle, IrqRegistry};
use crate::platform::PlatformDevice;
use regs::UsartRegs;
use transfer::ActiveTransfer;

/// Consecutive poll iterations without progress before a transfer is
/// abandoned with [`SpiError::Timeout`].
pub const DEFAULT_STALL_LIMIT: u32 = 10_000_000;

/// Name of the input clock in the platform description.
pub const CLOCK_NAME: &str = "usart";

/// Driver configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UsartSpiConfig {
    /// Poll-loop stall bound; `None` waits forever.
    pub stall_limit: Option<u32>,
}

impl UsartSpiConfig {
    pub const fn new() -> Self {
        Self {
            stall_limit: Some(DEFAULT_STALL_LIMIT),
        }
    }

    pub const fn with_stall_limit(mut self, limit: Option<u32>) -> Self {
        self.stall_limit = limit;
        self
    }
}

impl Default for UsartSpiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared with the interrupt handler under `UsartSpi::shared`.
struct Shared {
    current: Option<ActiveTransfer>,
}

/// One USART operated as an SPI master.
pub struct UsartSpi<B, C, P> {
    regs: UsartRegs<B>,
    clock: C,
    pins: P,
    irq: IrqNumber,
    irq_handle: spin::Mutex<Option<IrqHandle>>,

    shared: IrqSpinLock<Shared, PlatformIrq>,
    tx_remaining: AtomicUsize,
    rx_remaining: AtomicUsize,
    status: AtomicU32,
    xfer_failed: AtomicBool,

    spi_clk: u32,
    base_mode: Mode,
    power: spin::Mutex<PowerState>,
    config: UsartSpiConfig,
}

impl<B, C, P> UsartSpi<B, C, P>
where
    B: RegisterBus + 'static,
    C: Clock + 'static,
    P: PinControl + 'static,
{
    /// Bring up the controller described by `dev` and attach its interrupt
    /// handler to `registry`.
    pub fn probe<D>(
        dev: &mut D,
        registry: &IrqRegistry,
        config: UsartSpiConfig,
    ) -> Result<Arc<Self>, SpiError>
    where
        D: PlatformDevice<Bus = B, Clock = C, Pins = P>,
    {
        let regs = dev.take_registers().ok_or(SpiError::ResourceUnavailable)?;
        let irq = dev.irq().ok_or(SpiError::ResourceUnavailable)?;
        let clock = dev.take_clock(CLOCK_NAME).ok_or(SpiError::ClockUnavailable)?;
        let pins = dev.take_pins().ok_or(SpiError::ResourceUnavailable)?;

        clock.enable().map_err(|_| SpiError::ClockUnavailable)?;
        let spi_clk = clock.rate_hz();
        if spi_clk == 0 {
            clock.disable();
            return Err(SpiError::ClockUnavailable);
        }

        let ctrl = Arc::new(Self {
            regs: UsartRegs::new(regs),
            clock,
            pins,
            irq,
            irq_handle: spin::Mutex::new(None),
            shared: IrqSpinLock::new(Shared { current: None }),
            tx_remaining: AtomicUsize::new(0),
            rx_remaining: AtomicUsize::new(0),
            status: AtomicU32::new(0),
            xfer_failed: AtomicBool::new(false),
            spi_clk,
            base_mode: MODE_INIT,
            power: spin::Mutex::new(PowerState::Active),
            config,
        });

        ctrl.init();

        let handle = registry.register(irq, ctrl.clone());
        *ctrl.irq_handle.lock() = Some(handle);

        log::info!(
            "{}: AT91 USART SPI controller version {:#x} (irq {}, {} Hz)",
            dev.name(),
            ctrl.regs.version(),
            irq,
            spi_clk
        );

        Ok(ctrl)
    }
}

impl<B, C, P> UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    /// Detach from `registry` and stop the clock.
    ///
    /// Only `Active` holds a clock reference; a suspended controller already
    /// dropped it. The controller is left runtime suspended, so later
    /// transfers fail with [`SpiError::Suspended`] and a second `remove`
    /// releases nothing.
    pub fn remove(&self, registry: &IrqRegistry) {
        if let Some(handle) = self.irq_handle.lock().take() {
            registry.unregister(handle);
        }

        let mut power = self.power.lock();
        if *power == PowerState::Active {
            self.clock.disable();
            *power = PowerState::RuntimeSuspended;
        }
    }

    /// Put the peripheral in its post-probe state: fixed mode bits, both
    /// directions reset and disabled.
    fn init(&self) {
        self.regs.set_mode(self.base_mode);
        self.regs.control(Control::RESET | Control::DISABLE);
    }

    /// What this controller supports.
    pub fn caps(&self) -> ControllerCaps {
        ControllerCaps {
            mode_bits: SUPPORTED_MODES,
            bits_per_word_mask: 1 << (WORD_SIZE - 1),
            must_tx: true,
            must_rx: true,
            min_speed_hz: self.spi_clk.div_ceil(MAX_CLK_DIV - 1),
            max_speed_hz: self.spi_clk.div_ceil(MIN_CLK_DIV),
        }
    }

    /// Validate a device's mode and word size into a mode register value.
    ///
    /// Touches no hardware.
    pub fn configure(&self, mode: SpiMode, bits_per_word: u8) -> Result<DeviceConfig, SpiError> {
        config::compose(self.base_mode, mode, bits_per_word)
    }

    /// Input clock rate captured at probe.
    pub fn input_clock_hz(&self) -> u32 {
        self.spi_clk
    }

    pub fn irq(&self) -> IrqNumber {
        self.irq
    }

    pub fn power_state(&self) -> PowerState {
        *self.power.lock()
    }

    /// Whether a transfer currently has a receive buffer bound.
    pub fn in_flight(&self) -> bool {
        self.shared.lock().current.is_some()
    }

    /// Receive bytes still outstanding for the current or last transfer.
    pub fn rx_remaining(&self) -> usize {
        self.rx_remaining.load(Ordering::Acquire)
    }

    /// Transmit bytes still outstanding for the current or last transfer.
    pub fn tx_remaining(&self) -> usize {
        self.tx_remaining.load(Ordering::Acquire)
    }

    /// Last channel status read by either context.
    pub fn last_status(&self) -> Status {
        Status::from_bits_retain(self.status.load(Ordering::Relaxed))
    }

    fn read_status(&self) -> Status {
        let status = self.regs.status();
        self.status.store(status.bits(), Ordering::Relaxed);
        status
    }

    fn ensure_active(&self) -> Result<(), SpiError> {
        match *self.power.lock() {
            PowerState::Active => Ok(()),
            _ => Err(SpiError::Suspended),
        }
    }
}

impl<B, C, P> SpiController for UsartSpi<B, C, P>
where
    B: RegisterBus,
    C: Clock,
    P: PinControl,
{
    type DeviceState = DeviceConfig;

    fn setup(&self, spi: &mut SpiDevice<DeviceConfig>) -> Result<(), SpiError> {
        let config = self.configure(spi.mode, spi.bits_per_word).inspect_err(|err| {
            log::debug!("cs{}: setup rejected: {}", spi.chip_select, err);
        })?;

        *spi.state_or_insert_with(|| config) = config;

        log::debug!(
            "cs{}: setup: bpw {} mode {:#x} -> mr {:08x}",
            spi.chip_select,
            spi.bits_per_word,
            spi.mode.bits(),
            config.mode_register()
        );

        Ok(())
    }

    fn prepare_message(&self, spi: &SpiDevice<DeviceConfig>) -> Result<(), SpiError> {
        self.ensure_active()?;
        let config = spi.state().ok_or(SpiError::NotConfigured)?;

        self.regs.control(Control::ENABLE);
        self.regs.enable_irqs(OVRE_RXRDY_IRQS);
        self.regs.set_mode(config.mode());

        Ok(())
    }

    fn transfer_one(
        &self,
        spi: &SpiDevice<DeviceConfig>,
        xfer: &mut SpiTransfer<'_>,
    ) -> Result<(), SpiError> {
        self.run_transfer(spi, xfer)
    }

    fn unprepare_message(&self, _spi: &SpiDevice<DeviceConfig>) -> Result<(), SpiError> {
        self.regs.control(Control::RESET | Control::DISABLE);
        self.regs.disable_irqs(OVRE_RXRDY_IRQS);

        Ok(())
    }

    fn cleanup(&self, spi: &mut SpiDevice<DeviceConfig>) {
        spi.take_state();
    }
}
