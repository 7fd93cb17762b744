//! Stepper Pulse Timer: periodic interrupt scheduling step edges

use core::cell::Cell;
use critical_section::Mutex;
use portable_atomic::{AtomicU32, Ordering};

use super::{Callback, CallbackSlot, ProgramCell, StateCell, TimerMode, TimerProgram, TimerState};
use crate::clock::{Prescaler, PulsePeriod};
use crate::hal::{PortError, PulseCounter};

/// Periodic step timer.
///
/// `Idle -> Armed` on [`configure`](Self::configure), `-> Running` on
/// [`start`](Self::start), back to `Idle` on [`stop`](Self::stop). A
/// period stays configured across stop/start.
pub struct PulseTimer<C> {
    hw: C,
    state: StateCell,
    fires: AtomicU32,
    program: ProgramCell,
    /// Period currently loaded (or to load on start)
    period: Mutex<Cell<Option<PulsePeriod>>>,
    /// Period latched while running, applied at the next expiry
    latched: Mutex<Cell<Option<PulsePeriod>>>,
    callback: CallbackSlot,
}

impl<C: PulseCounter> PulseTimer<C> {
    pub const fn new(hw: C) -> Self {
        Self {
            hw,
            state: StateCell::new(),
            fires: AtomicU32::new(0),
            program: ProgramCell::new(TimerMode::Periodic),
            period: Mutex::new(Cell::new(None)),
            latched: Mutex::new(Cell::new(None)),
            callback: CallbackSlot::new(),
        }
    }

    /// Put the counter in clear-on-compare mode, interrupts off, unprescaled
    pub fn init(&self) {
        critical_section::with(|_| {
            self.hw.init();
            self.hw.enable_interrupt(false);
            self.hw.set_clock(Prescaler::Div1);
            self.hw.clear_pending();
        });
        self.state.set(TimerState::Idle);
    }

    /// Register the pulse-fired callback
    pub fn register_callback(&self, callback: Callback) {
        self.callback.register(callback);
    }

    /// Program the period in CPU cycles.
    ///
    /// While running, the new period takes effect from the next cycle; the
    /// cycle in flight keeps its length. Periods beyond the counter range
    /// saturate.
    pub fn configure(&self, period_cycles: u32) -> Result<(), PortError> {
        if period_cycles == 0 {
            return Err(PortError::ZeroPeriod);
        }
        let period = PulsePeriod::from_cycles(period_cycles);

        critical_section::with(|cs| {
            match self.state.get() {
                TimerState::Running => {
                    self.latched.borrow(cs).set(Some(period));
                }
                TimerState::Idle | TimerState::Armed => {
                    self.period.borrow(cs).set(Some(period));
                    self.hw.set_compare(period.compare);
                    self.program.update(cs, |p| p.period_or_duty = period.cycles());
                    self.state.set(TimerState::Armed);
                }
            }
        });
        Ok(())
    }

    /// Enable periodic interrupts, counting from zero at the configured period
    pub fn start(&self) -> Result<(), PortError> {
        critical_section::with(|cs| {
            if self.state.get() == TimerState::Running {
                return Ok(());
            }
            let period = self.period.borrow(cs).get().ok_or(PortError::NotInitialized)?;
            self.load(period);
            self.hw.reset_count();
            self.hw.clear_pending();
            self.hw.enable_interrupt(true);
            self.program.update(cs, |p| p.enabled = true);
            self.state.set(TimerState::Running);
            Ok(())
        })
    }

    /// Disable interrupts and return the counter clock to unprescaled.
    ///
    /// A compare match latched but not yet serviced is discarded.
    pub fn stop(&self) {
        critical_section::with(|cs| {
            self.hw.enable_interrupt(false);
            self.hw.set_clock(Prescaler::Div1);
            self.hw.clear_pending();
            if let Some(latched) = self.latched.borrow(cs).take() {
                self.period.borrow(cs).set(Some(latched));
                self.program.update(cs, |p| p.period_or_duty = latched.cycles());
            }
            self.program.update(cs, |p| p.enabled = false);
            self.state.set(TimerState::Idle);
        });
    }

    /// Compare-match vector body
    pub fn on_interrupt(&self) {
        if self.state.get() != TimerState::Running {
            return;
        }
        self.fires.fetch_add(1, Ordering::Relaxed);
        self.callback.invoke();

        // The callback may have stopped the timer or reprogrammed it for
        // the cycle that just began.
        critical_section::with(|cs| {
            if self.state.get() != TimerState::Running {
                return;
            }
            if let Some(latched) = self.latched.borrow(cs).take() {
                self.load(latched);
                self.period.borrow(cs).set(Some(latched));
                self.program.update(cs, |p| p.period_or_duty = latched.cycles());
            }
        });
    }

    fn load(&self, period: PulsePeriod) {
        self.hw.set_clock(period.prescaler);
        self.hw.set_compare(period.compare);
    }

    pub fn state(&self) -> TimerState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == TimerState::Running
    }

    /// Period in effect (or loaded on the next start)
    pub fn period(&self) -> Option<PulsePeriod> {
        critical_section::with(|cs| self.period.borrow(cs).get())
    }

    pub fn program(&self) -> TimerProgram {
        self.program.get()
    }

    /// Number of serviced expiries since power-up
    pub fn fire_count(&self) -> u32 {
        self.fires.load(Ordering::Relaxed)
    }

    pub fn hardware(&self) -> &C {
        &self.hw
    }
}
