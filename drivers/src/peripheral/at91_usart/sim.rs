//! Simulated USART, clock, pins and platform for driver tests.
//!
//! The register file models what the driver relies on: TXRDY gating under
//! WRDBT, RXRDY cleared by reading RHR, OVRE when a byte lands on an unread
//! one, and an interrupt output that is CSR masked by IMR. Nothing is
//! clocked out while the simulated input clock is gated. A test thread
//! plays the interrupt line by dispatching through a registry whenever that
//! output is high.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use super::{UsartSpi, UsartSpiConfig};
use crate::hal::clock::{Clock, ClockError};
use crate::hal::interrupt::IrqNumber;
use crate::hal::pinctrl::{PinControl, PinState, PinctrlError};
use crate::hal::spi::{SpiError, SpiMessageQueue};
use crate::hw::at91_usart::{
    BRGR_OFFSET, CR_OFFSET, CSR_OFFSET, Control, IDR_OFFSET, IER_OFFSET, MR_OFFSET, Mode,
    RHR_OFFSET, Status, THR_OFFSET, VERSION_OFFSET,
};
use crate::hw::mmio::RegisterBus;
use crate::irq_registry::IrqRegistry;
use crate::platform::PlatformDevice;

const SIM_VERSION: u32 = 0x0000_0213;

#[derive(Default)]
struct SimState {
    mr: u32,
    imr: u32,
    csr: u32,
    rhr: u8,
    brgr: u32,
    rx_enabled: bool,
    tx_enabled: bool,
    tx_log: Vec<u8>,
    miso: VecDeque<u8>,
    received: usize,
    overrun_at: Option<usize>,
    rhr_reads: usize,
}

impl SimState {
    fn txrdy(&self, clocked: bool) -> bool {
        let wrdbt = self.mr & Mode::WRDBT.bits() != 0;
        let rxrdy = self.csr & Status::RXRDY.bits() != 0;
        clocked && self.tx_enabled && !(wrdbt && rxrdy)
    }

    fn csr(&self, clocked: bool) -> u32 {
        let mut csr = self.csr;
        if self.txrdy(clocked) {
            csr |= Status::TXRDY.bits();
        }
        csr
    }

    fn receive(&mut self, byte: u8) {
        let index = self.received;
        self.received += 1;

        let injected = self.overrun_at == Some(index);
        if injected {
            self.overrun_at = None;
        }

        if injected || self.csr & Status::RXRDY.bits() != 0 {
            self.csr |= Status::OVRE.bits();
        } else {
            self.rhr = byte;
            self.csr |= Status::RXRDY.bits();
        }
    }

    fn transmit(&mut self, byte: u8, clocked: bool) {
        if !self.txrdy(clocked) {
            return;
        }
        self.tx_log.push(byte);

        let reply = match self.miso.pop_front() {
            Some(reply) => reply,
            None if self.mr & Mode::LOOP.bits() != 0 => byte,
            None => 0xff,
        };
        if self.rx_enabled {
            self.receive(reply);
        }
    }

    fn control(&mut self, cr: Control) {
        if cr.contains(Control::RSTRX) {
            self.csr &= !(Status::RXRDY | Status::OVRE).bits();
            self.rx_enabled = false;
        }
        if cr.contains(Control::RSTTX) {
            self.tx_enabled = false;
        }
        if cr.contains(Control::RXEN) {
            self.rx_enabled = true;
        }
        if cr.contains(Control::TXEN) {
            self.tx_enabled = true;
        }
        if cr.contains(Control::RXDIS) {
            self.rx_enabled = false;
        }
        if cr.contains(Control::TXDIS) {
            self.tx_enabled = false;
        }
    }
}

/// Simulated USART register window, fed by a [`SimClock`].
#[derive(Clone)]
pub(crate) struct SimUsart {
    state: Arc<spin::Mutex<SimState>>,
    clock_refs: Arc<AtomicUsize>,
}

impl SimUsart {
    fn clocked_by(clock: &SimClock) -> Self {
        Self {
            state: Arc::default(),
            clock_refs: clock.refs.clone(),
        }
    }

    fn clocked(&self) -> bool {
        self.clock_refs.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn mode(&self) -> u32 {
        self.state.lock().mr
    }

    pub(crate) fn irq_mask(&self) -> u32 {
        self.state.lock().imr
    }

    pub(crate) fn divisor(&self) -> u32 {
        self.state.lock().brgr
    }

    pub(crate) fn tx_enabled(&self) -> bool {
        self.state.lock().tx_enabled
    }

    pub(crate) fn rx_enabled(&self) -> bool {
        self.state.lock().rx_enabled
    }

    /// Bytes written to THR since the last `clear_log`.
    pub(crate) fn transmitted(&self) -> Vec<u8> {
        self.state.lock().tx_log.clone()
    }

    /// RHR reads since the last `clear_log`.
    pub(crate) fn rx_reads(&self) -> usize {
        self.state.lock().rhr_reads
    }

    pub(crate) fn clear_log(&self) {
        let mut state = self.state.lock();
        state.tx_log.clear();
        state.rhr_reads = 0;
    }

    /// Queue replies for the next bytes clocked out.
    pub(crate) fn script_miso(&self, bytes: &[u8]) {
        self.state.lock().miso.extend(bytes.iter().copied());
    }

    /// Lose the `n`th byte received from now on to an overrun.
    pub(crate) fn overrun_at(&self, n: usize) {
        let mut state = self.state.lock();
        state.overrun_at = Some(state.received + n);
    }

    /// A byte arrives without a matching THR write.
    pub(crate) fn inject_rx(&self, byte: u8) {
        self.state.lock().receive(byte);
    }

    /// Interrupt output of the peripheral.
    pub(crate) fn irq_asserted(&self) -> bool {
        let state = self.state.lock();
        state.csr(self.clocked()) & state.imr != 0
    }

    /// Lose all register contents, as across system sleep.
    pub(crate) fn power_cycle(&self) {
        let mut state = self.state.lock();
        let tx_log = core::mem::take(&mut state.tx_log);
        *state = SimState {
            mr: 0xdead_beef,
            tx_log,
            ..SimState::default()
        };
    }
}

impl RegisterBus for SimUsart {
    fn read32(&self, offset: usize) -> u32 {
        let state = self.state.lock();
        match offset {
            MR_OFFSET => state.mr,
            CSR_OFFSET => state.csr(self.clocked()),
            BRGR_OFFSET => state.brgr,
            VERSION_OFFSET => SIM_VERSION,
            _ => 0,
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        let mut state = self.state.lock();
        match offset {
            CR_OFFSET => state.control(Control::from_bits_truncate(value)),
            MR_OFFSET => state.mr = value,
            IER_OFFSET => state.imr |= value,
            IDR_OFFSET => state.imr &= !value,
            BRGR_OFFSET => state.brgr = value,
            _ => {}
        }
    }

    fn read8(&self, offset: usize) -> u8 {
        let mut state = self.state.lock();
        match offset {
            RHR_OFFSET => {
                state.csr &= !Status::RXRDY.bits();
                state.rhr_reads += 1;
                state.rhr
            }
            _ => 0,
        }
    }

    fn write8(&self, offset: usize, value: u8) {
        if offset == THR_OFFSET {
            self.state.lock().transmit(value, self.clocked());
        }
    }
}

/// Reference counted clock with an injectable enable failure.
#[derive(Clone)]
pub(crate) struct SimClock {
    refs: Arc<AtomicUsize>,
    rate: u32,
    fail: Arc<AtomicBool>,
}

impl SimClock {
    fn new(rate: u32) -> Self {
        Self {
            refs: Arc::new(AtomicUsize::new(0)),
            rate,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn refs(&self) -> usize {
        self.refs.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_enable(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn enable(&self) -> Result<(), ClockError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClockError::EnableFailed);
        }
        self.refs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable(&self) {
        self.refs.fetch_sub(1, Ordering::SeqCst);
    }

    fn rate_hz(&self) -> u32 {
        self.rate
    }
}

/// Pin controller that remembers the last state applied.
#[derive(Clone, Default)]
pub(crate) struct SimPins {
    last: Arc<spin::Mutex<Option<PinState>>>,
    fail: Arc<AtomicBool>,
}

impl SimPins {
    pub(crate) fn last(&self) -> Option<PinState> {
        *self.last.lock()
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl PinControl for SimPins {
    fn select(&self, state: PinState) -> Result<(), PinctrlError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PinctrlError::Apply);
        }
        *self.last.lock() = Some(state);
        Ok(())
    }
}

/// Message queue that counts transitions.
#[derive(Default)]
pub(crate) struct SimQueue {
    suspends: AtomicU32,
    resumes: AtomicU32,
    fail_suspend: AtomicBool,
}

impl SimQueue {
    pub(crate) fn suspends(&self) -> u32 {
        self.suspends.load(Ordering::SeqCst)
    }

    pub(crate) fn resumes(&self) -> u32 {
        self.resumes.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_suspend(&self, fail: bool) {
        self.fail_suspend.store(fail, Ordering::SeqCst);
    }
}

impl SpiMessageQueue for SimQueue {
    fn suspend(&self) -> Result<(), SpiError> {
        if self.fail_suspend.load(Ordering::SeqCst) {
            return Err(SpiError::Queue);
        }
        self.suspends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> Result<(), SpiError> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Platform description of one simulated USART. Clear a field to make the
/// resource missing.
pub(crate) struct SimPlatform {
    pub(crate) regs: Option<SimUsart>,
    pub(crate) irq: Option<IrqNumber>,
    pub(crate) clock: Option<SimClock>,
    pub(crate) pins: Option<SimPins>,
}

impl SimPlatform {
    pub(crate) const IRQ: IrqNumber = 19;
    pub(crate) const RATE: u32 = 133_000_000;

    pub(crate) fn new() -> Self {
        Self::with_rate(Self::RATE)
    }

    pub(crate) fn with_rate(rate: u32) -> Self {
        let clock = SimClock::new(rate);
        Self {
            regs: Some(SimUsart::clocked_by(&clock)),
            irq: Some(Self::IRQ),
            clock: Some(clock),
            pins: Some(SimPins::default()),
        }
    }
}

impl PlatformDevice for SimPlatform {
    type Bus = SimUsart;
    type Clock = SimClock;
    type Pins = SimPins;

    fn name(&self) -> &str {
        "sim-usart"
    }

    fn take_registers(&mut self) -> Option<SimUsart> {
        self.regs.take()
    }

    fn irq(&self) -> Option<IrqNumber> {
        self.irq
    }

    fn take_clock(&mut self, name: &str) -> Option<SimClock> {
        match name {
            super::CLOCK_NAME => self.clock.take(),
            _ => None,
        }
    }

    fn take_pins(&mut self) -> Option<SimPins> {
        self.pins.take()
    }
}

/// Thread standing in for the interrupt line. Stops on drop.
pub(crate) struct IrqLine {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl IrqLine {
    fn start(usart: SimUsart, registry: Arc<IrqRegistry>, irq: IrqNumber) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    if usart.irq_asserted() {
                        registry.dispatch(irq);
                    } else {
                        thread::yield_now();
                    }
                }
            })
        };

        Self {
            stop,
            thread: Some(thread),
        }
    }
}

impl Drop for IrqLine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub(crate) type SimSpi = UsartSpi<SimUsart, SimClock, SimPins>;

/// A probed controller with handles on every simulated resource.
pub(crate) struct Fixture {
    pub(crate) ctrl: Arc<SimSpi>,
    pub(crate) usart: SimUsart,
    pub(crate) clock: SimClock,
    pub(crate) pins: SimPins,
    pub(crate) registry: Arc<IrqRegistry>,
    line: Option<IrqLine>,
}

impl Fixture {
    /// Probe with the interrupt line running.
    pub(crate) fn new(config: UsartSpiConfig) -> Self {
        let mut fx = Self::without_irq_line(config);
        fx.line = Some(fx.start_irq_line());
        fx
    }

    /// Probe with nobody servicing interrupts; tests call the handler
    /// themselves or start the line later.
    pub(crate) fn without_irq_line(config: UsartSpiConfig) -> Self {
        let mut dev = SimPlatform::new();
        let usart = dev.regs.clone().expect("sim registers");
        let clock = dev.clock.clone().expect("sim clock");
        let pins = dev.pins.clone().expect("sim pins");
        let registry = Arc::new(IrqRegistry::new());

        let ctrl = UsartSpi::probe(&mut dev, &registry, config).expect("probe");

        Self {
            ctrl,
            usart,
            clock,
            pins,
            registry,
            line: None,
        }
    }

    pub(crate) fn start_irq_line(&self) -> IrqLine {
        IrqLine::start(self.usart.clone(), self.registry.clone(), self.ctrl.irq())
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.line.take();
    }
}
