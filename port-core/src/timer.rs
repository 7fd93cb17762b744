//! Timer components shared types
//!
//! Four timer roles sit on top of the back-end counters:
//! - [`PulseTimer`]: periodic, schedules step edges (SPT).
//! - [`ResetTimer`]: one-shot, ends a step pulse (SRT).
//! - [`SpindlePwm`]: duty-cycle output for spindle speed (VST).
//! - [`DebounceTimer`]: coarse one-shot delaying limit re-reads (DT).
//!
//! Every component is usable through `&self`, so one instance can be a
//! `static` shared by main-line code and its interrupt vector. The vector
//! calls `on_interrupt()`; the registered [`Callback`] runs from there.

use core::cell::Cell;
use critical_section::Mutex;
use portable_atomic::{AtomicU8, Ordering};

pub mod debounce;
pub mod pulse;
pub mod reset;
pub mod spindle;

pub use debounce::DebounceTimer;
pub use pulse::PulseTimer;
pub use reset::ResetTimer;
pub use spindle::{PwmRange, SpindlePwm};

/// Callback invoked from interrupt context when a timer fires
pub type Callback = fn();

/// How a timer counter is programmed
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    Periodic,
    OneShot,
    Pwm,
}

/// Snapshot of a timer component's program
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerProgram {
    pub mode: TimerMode,
    /// Period in CPU cycles, delay in counter ticks, or duty units
    pub period_or_duty: u32,
    pub enabled: bool,
}

impl TimerProgram {
    /// Disabled program created at init
    pub const fn idle(mode: TimerMode) -> Self {
        Self {
            mode,
            period_or_duty: 0,
            enabled: false,
        }
    }
}

/// Timer component states
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// Not counting, no interrupt expected
    Idle,
    /// Programmed and waiting (Pulse: configured, Reset/Debounce: window open)
    Armed,
    /// Periodic interrupts enabled
    Running,
}

impl TimerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => TimerState::Armed,
            2 => TimerState::Running,
            _ => TimerState::Idle,
        }
    }
}

/// Lock-free state cell readable from any context
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(TimerState::Idle as u8))
    }

    pub(crate) fn get(&self) -> TimerState {
        TimerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: TimerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move `from` -> `to`; false if the state was something else
    pub(crate) fn transition(&self, from: TimerState, to: TimerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Callback slot written once at init, read from interrupt context
pub(crate) struct CallbackSlot(Mutex<Cell<Option<Callback>>>);

impl CallbackSlot {
    pub(crate) const fn new() -> Self {
        Self(Mutex::new(Cell::new(None)))
    }

    pub(crate) fn register(&self, callback: Callback) {
        critical_section::with(|cs| self.0.borrow(cs).set(Some(callback)));
    }

    pub(crate) fn invoke(&self) {
        let callback = critical_section::with(|cs| self.0.borrow(cs).get());
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Program cell shared between main-line and interrupt context
pub(crate) struct ProgramCell(Mutex<Cell<TimerProgram>>);

impl ProgramCell {
    pub(crate) const fn new(mode: TimerMode) -> Self {
        Self(Mutex::new(Cell::new(TimerProgram::idle(mode))))
    }

    pub(crate) fn get(&self) -> TimerProgram {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }

    pub(crate) fn set(&self, cs: critical_section::CriticalSection<'_>, program: TimerProgram) {
        self.0.borrow(cs).set(program);
    }

    pub(crate) fn update(&self, cs: critical_section::CriticalSection<'_>, f: impl FnOnce(&mut TimerProgram)) {
        let cell = self.0.borrow(cs);
        let mut program = cell.get();
        f(&mut program);
        cell.set(program);
    }
}
