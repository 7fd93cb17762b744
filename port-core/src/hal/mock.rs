//! Simulated back-end for testing
//!
//! Counters are modelled against a shared [`SimClock`] counting CPU cycles,
//! so tests can ask when the next interrupt is due, move the clock there
//! and call the component's `on_interrupt()` like the vector would.

use super::*;
use crate::clock::TICKS_PER_MILLISECOND;
use core::cell::{Cell, RefCell};

/// Simulated CPU cycle counter
#[derive(Default)]
pub struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    pub const fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn set(&self, cycles: u64) {
        self.now.set(cycles);
    }

    pub fn advance(&self, cycles: u64) {
        self.now.set(self.now.get() + cycles);
    }
}

/// First tick of the series `first + k * every` strictly after `t`
fn next_after(first: u64, every: u64, t: u64) -> u64 {
    if t < first {
        first
    } else {
        first + ((t - first) / every + 1) * every
    }
}

/// Earliest of several optional deadlines, with its index
pub fn earliest(deadlines: &[Option<u64>]) -> Option<(usize, u64)> {
    deadlines
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.map(|d| (i, d)))
        .min_by_key(|&(_, d)| d)
}

#[derive(Default)]
struct SimPort {
    direction: Cell<u8>,
    output: Cell<u8>,
    change_mask: Cell<u8>,
    /// Bits driven from outside, and their levels
    driven: Cell<u8>,
    external: Cell<u8>,
}

impl SimPort {
    /// Pin levels: outputs follow the latch, undriven inputs follow the pull-up
    fn levels(&self) -> u8 {
        let ddr = self.direction.get();
        let driven = self.driven.get() & !ddr;
        let pulled = self.output.get() & !ddr & !driven;
        (self.output.get() & ddr) | (self.external.get() & driven) | pulled
    }
}

/// Simulated I/O port register file
#[derive(Default)]
pub struct SimPorts {
    ports: [SimPort; PortId::COUNT],
    change_groups: Cell<u8>,
}

impl SimPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive input pins in `mask` to `levels` from outside.
    ///
    /// Returns true if the change would raise a pin-change interrupt.
    pub fn drive(&self, port: PortId, mask: u8, levels: u8) -> bool {
        let p = &self.ports[port.index()];
        let before = p.levels();
        p.driven.set(p.driven.get() | mask);
        p.external.set((p.external.get() & !mask) | (levels & mask));
        self.change_raised(port, before ^ p.levels())
    }

    /// Stop driving pins in `mask`; they fall back to their pull-ups
    pub fn release(&self, port: PortId, mask: u8) -> bool {
        let p = &self.ports[port.index()];
        let before = p.levels();
        p.driven.set(p.driven.get() & !mask);
        self.change_raised(port, before ^ p.levels())
    }

    fn change_raised(&self, port: PortId, changed: u8) -> bool {
        let p = &self.ports[port.index()];
        self.change_group_enabled(port) && changed & p.change_mask.get() & !p.direction.get() != 0
    }

    /// Pin levels as seen on the package
    pub fn levels(&self, port: PortId) -> u8 {
        self.ports[port.index()].levels()
    }

    pub fn output(&self, port: PortId) -> u8 {
        self.ports[port.index()].output.get()
    }

    pub fn direction(&self, port: PortId) -> u8 {
        self.ports[port.index()].direction.get()
    }

    pub fn change_mask(&self, port: PortId) -> u8 {
        self.ports[port.index()].change_mask.get()
    }
}

impl PortRegisters for SimPorts {
    fn read(&self, port: PortId, reg: PortRegister) -> u8 {
        let p = &self.ports[port.index()];
        match reg {
            PortRegister::Direction => p.direction.get(),
            PortRegister::Output => p.output.get(),
            PortRegister::Input => p.levels(),
            PortRegister::ChangeMask => p.change_mask.get(),
        }
    }

    fn write(&self, port: PortId, reg: PortRegister, value: u8) {
        let p = &self.ports[port.index()];
        match reg {
            PortRegister::Direction => p.direction.set(value),
            PortRegister::Output => p.output.set(value),
            // Writing the input register is ignored in this model
            PortRegister::Input => {}
            PortRegister::ChangeMask => p.change_mask.set(value),
        }
    }

    fn enable_change_group(&self, port: PortId, enable: bool) {
        let bit = 1 << port.index();
        let groups = self.change_groups.get();
        self.change_groups.set(if enable { groups | bit } else { groups & !bit });
    }

    fn change_group_enabled(&self, port: PortId) -> bool {
        self.change_groups.get() & (1 << port.index()) != 0
    }
}

/// Simulated clear-on-compare counter
pub struct SimPulseCounter<'a> {
    clock: &'a SimClock,
    prescaler: Cell<Option<Prescaler>>,
    compare: Cell<u16>,
    origin: Cell<u64>,
    irq: Cell<bool>,
    last_clear: Cell<u64>,
    latched: Cell<bool>,
}

impl<'a> SimPulseCounter<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            prescaler: Cell::new(None),
            compare: Cell::new(u16::MAX),
            origin: Cell::new(0),
            irq: Cell::new(false),
            last_clear: Cell::new(0),
            latched: Cell::new(false),
        }
    }

    fn cycle(&self) -> u64 {
        let divisor = self.prescaler.get().map_or(1, |p| p.divisor());
        (self.compare.get() as u64 + 1) * divisor as u64
    }

    /// Move the origin to the last compare match, keeping the phase
    fn rebase(&self) {
        let now = self.clock.now();
        let origin = self.origin.get();
        if now > origin {
            let cycle = self.cycle();
            let boundary = origin + (now - origin) / cycle * cycle;
            if boundary > origin && boundary > self.last_clear.get() {
                self.latched.set(true);
            }
            self.origin.set(boundary);
        }
    }

    /// Cycle of the next compare-match interrupt, if enabled
    pub fn next_expiry(&self) -> Option<u64> {
        if !self.irq.get() || self.prescaler.get().is_none() {
            return None;
        }
        Some(next_after(self.origin.get() + self.cycle(), self.cycle(), self.clock.now()))
    }

    pub fn prescaler(&self) -> Option<Prescaler> {
        self.prescaler.get()
    }

    pub fn compare(&self) -> u16 {
        self.compare.get()
    }

    pub fn interrupt_enabled(&self) -> bool {
        self.irq.get()
    }
}

impl PulseCounter for SimPulseCounter<'_> {
    fn init(&self) {
        self.prescaler.set(Some(Prescaler::Div1));
        self.origin.set(self.clock.now());
        self.last_clear.set(self.clock.now());
    }

    fn set_clock(&self, prescaler: Prescaler) {
        self.rebase();
        self.prescaler.set(Some(prescaler));
    }

    fn set_compare(&self, compare: u16) {
        self.rebase();
        self.compare.set(compare);
    }

    fn reset_count(&self) {
        self.origin.set(self.clock.now());
    }

    fn enable_interrupt(&self, enable: bool) {
        self.irq.set(enable);
    }

    fn clear_pending(&self) {
        self.latched.set(false);
        self.last_clear.set(self.clock.now());
    }

    fn interrupt_pending(&self) -> bool {
        if self.latched.get() {
            return true;
        }
        if self.prescaler.get().is_none() {
            return false;
        }
        let cycle = self.cycle();
        let from = self.last_clear.get().max(self.origin.get());
        next_after(self.origin.get() + cycle, cycle, from) <= self.clock.now()
    }
}

/// Simulated 8-bit overflow counter at 1/8 CPU clock
pub struct SimResetCounter<'a> {
    clock: &'a SimClock,
    count: Cell<u16>,
    origin: Cell<u64>,
    running: Cell<bool>,
    latched: Cell<bool>,
    last_clear: Cell<u64>,
}

impl<'a> SimResetCounter<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            count: Cell::new(0),
            origin: Cell::new(0),
            running: Cell::new(false),
            latched: Cell::new(false),
            last_clear: Cell::new(0),
        }
    }

    fn tick() -> u64 {
        Self::PRESCALER.divisor() as u64
    }

    fn first_overflow(&self) -> u64 {
        self.origin.get() + (Self::MODULUS - self.count.get()) as u64 * Self::tick()
    }

    fn overflow_due(&self) -> bool {
        let every = Self::MODULUS as u64 * Self::tick();
        next_after(self.first_overflow(), every, self.last_clear.get()) <= self.clock.now()
    }

    /// Cycle of the next overflow, if counting
    pub fn next_expiry(&self) -> Option<u64> {
        if !self.running.get() {
            return None;
        }
        let every = Self::MODULUS as u64 * Self::tick();
        Some(next_after(self.first_overflow(), every, self.clock.now()))
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

impl ResetCounter for SimResetCounter<'_> {
    const MODULUS: u16 = 256;
    const PRESCALER: Prescaler = Prescaler::Div8;

    fn init(&self) {
        self.count.set(0);
        self.running.set(false);
        self.latched.set(false);
    }

    fn load(&self, count: u16) {
        self.count.set(count);
        self.origin.set(self.clock.now());
    }

    fn start(&self) {
        if !self.running.get() {
            self.origin.set(self.clock.now());
            self.running.set(true);
        }
    }

    fn stop(&self) {
        if self.running.get() && self.overflow_due() {
            self.latched.set(true);
        }
        self.running.set(false);
    }

    fn clear_pending(&self) {
        self.latched.set(false);
        self.last_clear.set(self.clock.now());
    }

    fn interrupt_pending(&self) -> bool {
        self.latched.get() || (self.running.get() && self.overflow_due())
    }
}

/// Simulated 8-bit fast-PWM counter
#[derive(Default)]
pub struct SimPwmCounter {
    compare: Cell<u16>,
    connected: Cell<bool>,
    initialized: Cell<bool>,
}

impl SimPwmCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(&self) -> u16 {
        self.compare.get()
    }

    /// Duty seen on the pin: zero while disconnected
    pub fn output_duty(&self) -> u16 {
        if self.connected.get() {
            self.compare.get()
        } else {
            0
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }
}

impl PwmCounter for SimPwmCounter {
    const MAX_DUTY: u16 = 255;

    fn init(&self) {
        self.initialized.set(true);
    }

    fn set_compare(&self, duty: u16) {
        self.compare.set(duty.min(Self::MAX_DUTY));
    }

    fn connect_output(&self, connect: bool) {
        self.connected.set(connect);
    }

    fn output_connected(&self) -> bool {
        self.connected.get()
    }
}

/// Simulated watchdog in interrupt mode
pub struct SimWatchdog<'a> {
    clock: &'a SimClock,
    timeout: Cell<WatchdogTimeout>,
    origin: Cell<u64>,
    running: Cell<bool>,
    latched: Cell<bool>,
    last_clear: Cell<u64>,
}

impl<'a> SimWatchdog<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            clock,
            timeout: Cell::new(WatchdogTimeout::Ms16),
            origin: Cell::new(0),
            running: Cell::new(false),
            latched: Cell::new(false),
            last_clear: Cell::new(0),
        }
    }

    fn every(&self) -> u64 {
        self.timeout.get().millis() as u64 * TICKS_PER_MILLISECOND as u64
    }

    fn timeout_due(&self) -> bool {
        next_after(self.origin.get() + self.every(), self.every(), self.last_clear.get()) <= self.clock.now()
    }

    /// Cycle of the next timeout interrupt, if enabled
    pub fn next_expiry(&self) -> Option<u64> {
        if !self.running.get() {
            return None;
        }
        Some(next_after(self.origin.get() + self.every(), self.every(), self.clock.now()))
    }

    pub fn timeout(&self) -> WatchdogTimeout {
        self.timeout.get()
    }
}

impl DebounceCounter for SimWatchdog<'_> {
    fn init(&self, timeout: WatchdogTimeout) {
        self.timeout.set(timeout);
        self.running.set(false);
        self.latched.set(false);
    }

    fn set_timeout(&self, timeout: WatchdogTimeout) {
        self.timeout.set(timeout);
    }

    fn start(&self) {
        if !self.running.get() {
            self.origin.set(self.clock.now());
            self.running.set(true);
        }
    }

    fn stop(&self) {
        if self.running.get() && self.timeout_due() {
            self.latched.set(true);
        }
        self.running.set(false);
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn clear_pending(&self) {
        self.latched.set(false);
        self.last_clear.set(self.clock.now());
    }

    fn interrupt_pending(&self) -> bool {
        self.latched.get() || (self.running.get() && self.timeout_due())
    }
}

/// Simulated UART capturing transmitted bytes
#[derive(Default)]
pub struct SimUart {
    baud: Cell<Option<u32>>,
    tx_irq: Cell<bool>,
    rx_data: Cell<u8>,
    sent: RefCell<heapless::Vec<u8, 256>>,
}

impl SimUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a received byte; the caller then runs the receive vector
    pub fn receive(&self, byte: u8) {
        self.rx_data.set(byte);
    }

    /// Bytes written to the data register so far
    pub fn sent(&self) -> heapless::Vec<u8, 256> {
        self.sent.borrow().clone()
    }

    pub fn baud(&self) -> Option<u32> {
        self.baud.get()
    }
}

impl SerialRegisters for SimUart {
    fn init(&self, baud: u32) {
        self.baud.set(Some(baud));
        self.tx_irq.set(false);
    }

    fn enable_tx_interrupt(&self, enable: bool) {
        self.tx_irq.set(enable);
    }

    fn tx_interrupt_enabled(&self) -> bool {
        self.tx_irq.get()
    }

    fn write_data(&self, byte: u8) {
        // Drop on overflow; tests never send that much
        let _ = self.sent.borrow_mut().push(byte);
    }

    fn read_data(&self) -> u8 {
        self.rx_data.get()
    }
}

/// Complete simulated back-end sharing one clock
pub struct SimHal<'a> {
    pub ports: SimPorts,
    pub pulse: SimPulseCounter<'a>,
    pub reset: SimResetCounter<'a>,
    pub spindle: SimPwmCounter,
    pub debounce: SimWatchdog<'a>,
    pub serial: SimUart,
}

impl<'a> SimHal<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self {
            ports: SimPorts::new(),
            pulse: SimPulseCounter::new(clock),
            reset: SimResetCounter::new(clock),
            spindle: SimPwmCounter::new(),
            debounce: SimWatchdog::new(clock),
            serial: SimUart::new(),
        }
    }
}

impl<'a> PortHal for SimHal<'a> {
    type Ports = SimPorts;
    type Pulse = SimPulseCounter<'a>;
    type Reset = SimResetCounter<'a>;
    type Spindle = SimPwmCounter;
    type Debounce = SimWatchdog<'a>;
    type Serial = SimUart;

    fn split(self) -> HalParts<SimPorts, SimPulseCounter<'a>, SimResetCounter<'a>, SimPwmCounter, SimWatchdog<'a>, SimUart> {
        HalParts {
            ports: self.ports,
            pulse: self.pulse,
            reset: self.reset,
            spindle: self.spindle,
            debounce: self.debounce,
            serial: self.serial,
        }
    }
}
