//! Stepper Reset Timer: one-shot that ends a step pulse

use portable_atomic::{AtomicU32, Ordering};

use super::{Callback, CallbackSlot, ProgramCell, StateCell, TimerMode, TimerProgram, TimerState};
use crate::hal::ResetCounter;

/// One-shot, retriggerable pulse-end timer.
///
/// `Idle -> Armed` on [`arm`](Self::arm); the fire returns it to `Idle`
/// on its own.
pub struct ResetTimer<C> {
    hw: C,
    state: StateCell,
    fires: AtomicU32,
    program: ProgramCell,
    callback: CallbackSlot,
}

impl<C: ResetCounter> ResetTimer<C> {
    pub const fn new(hw: C) -> Self {
        Self {
            hw,
            state: StateCell::new(),
            fires: AtomicU32::new(0),
            program: ProgramCell::new(TimerMode::OneShot),
            callback: CallbackSlot::new(),
        }
    }

    /// Normal counting mode, clock stopped
    pub fn init(&self) {
        critical_section::with(|_| {
            self.hw.init();
            self.hw.stop();
            self.hw.clear_pending();
        });
        self.state.set(TimerState::Idle);
    }

    /// Register the reset-fired callback
    pub fn register_callback(&self, callback: Callback) {
        self.callback.register(callback);
    }

    /// Fire once, `delay_ticks` counter ticks from now.
    ///
    /// A zero delay fires after the shortest possible wait of one tick.
    /// Delays beyond the counter modulus saturate. Re-arming restarts the
    /// window.
    pub fn arm(&self, delay_ticks: u16) {
        let ticks = delay_ticks.clamp(1, C::MODULUS);
        critical_section::with(|cs| {
            self.hw.stop();
            self.hw.clear_pending();
            self.hw.load(C::MODULUS - ticks);
            self.hw.start();
            self.program.set(
                cs,
                TimerProgram {
                    mode: TimerMode::OneShot,
                    period_or_duty: ticks as u32,
                    enabled: true,
                },
            );
            self.state.set(TimerState::Armed);
        });
    }

    /// Cancel without firing; a latched overflow is discarded
    pub fn disarm(&self) {
        critical_section::with(|cs| {
            self.hw.stop();
            self.hw.clear_pending();
            self.program.update(cs, |p| p.enabled = false);
            self.state.set(TimerState::Idle);
        });
    }

    /// Overflow vector body
    pub fn on_interrupt(&self) {
        if !self.state.transition(TimerState::Armed, TimerState::Idle) {
            return;
        }
        critical_section::with(|cs| {
            self.hw.stop();
            self.hw.clear_pending();
            self.program.update(cs, |p| p.enabled = false);
        });
        self.fires.fetch_add(1, Ordering::Relaxed);
        self.callback.invoke();
    }

    pub fn state(&self) -> TimerState {
        self.state.get()
    }

    pub fn is_armed(&self) -> bool {
        self.state.get() == TimerState::Armed
    }

    pub fn program(&self) -> TimerProgram {
        self.program.get()
    }

    /// Number of serviced fires since power-up
    pub fn fire_count(&self) -> u32 {
        self.fires.load(Ordering::Relaxed)
    }

    pub fn hardware(&self) -> &C {
        &self.hw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{SimClock, SimResetCounter};

    const TICK: u64 = 8;

    fn fire(timer: &ResetTimer<SimResetCounter<'_>>, clock: &SimClock) -> u64 {
        let at = timer.hardware().next_expiry().expect("reset timer should be armed");
        clock.set(at);
        timer.on_interrupt();
        at
    }

    #[test]
    fn test_fires_after_delay() {
        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        clock.set(1000);
        for delay in [1u16, 6, 10, 100, 255, 256] {
            let armed_at = clock.now();
            timer.arm(delay);
            assert!(timer.is_armed());
            let at = fire(&timer, &clock);
            assert_eq!((at - armed_at) / TICK, delay as u64);
            assert_eq!(timer.state(), TimerState::Idle);
            assert_eq!(timer.hardware().next_expiry(), None);
        }
        assert_eq!(timer.fire_count(), 6);
    }

    #[test]
    fn test_zero_delay_fires_after_one_tick() {
        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        timer.arm(0);
        assert_eq!(timer.program().period_or_duty, 1);
        let at = fire(&timer, &clock);
        assert_eq!(at, TICK);
        assert_eq!(timer.fire_count(), 1);
    }

    #[test]
    fn test_delay_saturates_at_modulus() {
        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        timer.arm(1000);
        assert_eq!(timer.program().period_or_duty, 256);
        assert_eq!(fire(&timer, &clock), 256 * TICK);
    }

    #[test]
    fn test_fires_exactly_once() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn on_reset() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        timer.register_callback(on_reset);
        timer.arm(10);
        fire(&timer, &clock);
        // A second vector entry without re-arming does nothing
        timer.on_interrupt();
        assert_eq!(FIRED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_disarm_leaves_no_pending_fire() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn on_reset() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        timer.register_callback(on_reset);
        timer.arm(10);

        // Overflow while interrupts are masked
        clock.set(20 * TICK);
        assert!(timer.hardware().interrupt_pending());
        timer.disarm();
        assert!(!timer.hardware().interrupt_pending());
        assert_eq!(timer.hardware().next_expiry(), None);

        timer.on_interrupt();
        assert_eq!(FIRED.load(Ordering::Relaxed), 0);
        assert!(!timer.program().enabled);
    }

    #[test]
    fn test_rearm_restarts_window() {
        let clock = SimClock::new();
        let timer = ResetTimer::new(SimResetCounter::new(&clock));
        timer.init();
        timer.arm(100);
        clock.set(50 * TICK);
        timer.arm(10);
        assert_eq!(fire(&timer, &clock), 60 * TICK);
        assert_eq!(timer.fire_count(), 1);
    }
}
