//! Debounce Timer: coarse one-shot delaying the limit switch re-read

use core::cell::Cell;
use critical_section::Mutex;
use portable_atomic::{AtomicU32, Ordering};

use super::{Callback, CallbackSlot, ProgramCell, StateCell, TimerMode, TimerProgram, TimerState};
use crate::clock::WatchdogTimeout;
use crate::hal::{DebounceCounter, Duration, PortError};

/// One-shot switch debounce window.
///
/// Arming while the window is open does nothing: the first edge of a
/// bounce burst sets the deadline and later edges do not push it out.
pub struct DebounceTimer<C> {
    hw: C,
    state: StateCell,
    fires: AtomicU32,
    timeout: Mutex<Cell<WatchdogTimeout>>,
    program: ProgramCell,
    callback: CallbackSlot,
}

impl<C: DebounceCounter> DebounceTimer<C> {
    pub const fn new(hw: C) -> Self {
        Self {
            hw,
            state: StateCell::new(),
            fires: AtomicU32::new(0),
            timeout: Mutex::new(Cell::new(WatchdogTimeout::Ms32)),
            program: ProgramCell::new(TimerMode::OneShot),
            callback: CallbackSlot::new(),
        }
    }

    /// Interrupt mode with the given window, not armed
    pub fn init(&self, timeout: WatchdogTimeout) {
        critical_section::with(|cs| {
            self.hw.init(timeout);
            self.hw.stop();
            self.hw.clear_pending();
            self.timeout.borrow(cs).set(timeout);
            self.program.set(
                cs,
                TimerProgram {
                    mode: TimerMode::OneShot,
                    period_or_duty: timeout.millis(),
                    enabled: false,
                },
            );
        });
        self.state.set(TimerState::Idle);
    }

    /// Register the debounce-expired callback
    pub fn register_callback(&self, callback: Callback) {
        self.callback.register(callback);
    }

    /// Pick the shortest hardware timeout covering `window`.
    ///
    /// Fails with [`PortError::InvalidConfig`] while a window is open.
    pub fn set_window(&self, window: Duration) -> Result<WatchdogTimeout, PortError> {
        let timeout = WatchdogTimeout::covering(window.as_millis());
        critical_section::with(|cs| {
            if self.state.get() == TimerState::Armed {
                return Err(PortError::InvalidConfig);
            }
            self.hw.set_timeout(timeout);
            self.timeout.borrow(cs).set(timeout);
            self.program.update(cs, |p| p.period_or_duty = timeout.millis());
            Ok(timeout)
        })
    }

    /// Open the window. Returns false if it was already open.
    pub fn arm(&self) -> bool {
        critical_section::with(|cs| {
            if self.state.get() == TimerState::Armed || self.hw.is_running() {
                return false;
            }
            self.hw.clear_pending();
            self.hw.start();
            self.program.update(cs, |p| p.enabled = true);
            self.state.set(TimerState::Armed);
            true
        })
    }

    /// Close the window without firing
    pub fn disarm(&self) {
        critical_section::with(|cs| {
            self.hw.stop();
            self.hw.clear_pending();
            self.program.update(cs, |p| p.enabled = false);
            self.state.set(TimerState::Idle);
        });
    }

    /// Timeout vector body
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

    pub fn timeout(&self) -> WatchdogTimeout {
        critical_section::with(|cs| self.timeout.borrow(cs).get())
    }

    pub fn program(&self) -> TimerProgram {
        self.program.get()
    }

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
    use crate::clock::TICKS_PER_MILLISECOND;
    use crate::hal::mock::{SimClock, SimWatchdog};

    const MS: u64 = TICKS_PER_MILLISECOND as u64;

    #[test]
    fn test_fires_once_after_window() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn on_debounce() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let clock = SimClock::new();
        let timer = DebounceTimer::new(SimWatchdog::new(&clock));
        timer.init(WatchdogTimeout::Ms32);
        timer.register_callback(on_debounce);

        assert!(timer.arm());
        assert_eq!(timer.hardware().next_expiry(), Some(32 * MS));
        clock.set(32 * MS);
        timer.on_interrupt();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(!timer.hardware().is_running());

        timer.on_interrupt();
        assert_eq!(FIRED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_rearm_does_not_extend_window() {
        let clock = SimClock::new();
        let timer = DebounceTimer::new(SimWatchdog::new(&clock));
        timer.init(WatchdogTimeout::Ms32);

        assert!(timer.arm());
        // Bounce edges inside the window
        for ms in [3u64, 9, 20, 31] {
            clock.set(ms * MS);
            assert!(!timer.arm());
        }
        assert_eq!(timer.hardware().next_expiry(), Some(32 * MS));
    }

    #[test]
    fn test_arm_after_fire_opens_new_window() {
        let clock = SimClock::new();
        let timer = DebounceTimer::new(SimWatchdog::new(&clock));
        timer.init(WatchdogTimeout::Ms16);
        timer.arm();
        clock.set(16 * MS);
        timer.on_interrupt();

        clock.set(100 * MS);
        assert!(timer.arm());
        assert_eq!(timer.hardware().next_expiry(), Some(116 * MS));
        assert_eq!(timer.fire_count(), 1);
    }

    #[test]
    fn test_disarm_cancels() {
        let clock = SimClock::new();
        let timer = DebounceTimer::new(SimWatchdog::new(&clock));
        timer.init(WatchdogTimeout::Ms32);
        timer.arm();
        clock.set(40 * MS);
        assert!(timer.hardware().interrupt_pending());
        timer.disarm();
        assert!(!timer.hardware().interrupt_pending());
        timer.on_interrupt();
        assert_eq!(timer.fire_count(), 0);
    }

    #[test]
    fn test_set_window_picks_covering_timeout() {
        let clock = SimClock::new();
        let timer = DebounceTimer::new(SimWatchdog::new(&clock));
        timer.init(WatchdogTimeout::Ms32);

        assert_eq!(timer.set_window(Duration::from_millis(250)), Ok(WatchdogTimeout::Ms250));
        assert_eq!(timer.set_window(Duration::from_millis(20)), Ok(WatchdogTimeout::Ms32));
        assert_eq!(timer.hardware().timeout(), WatchdogTimeout::Ms32);
        assert_eq!(timer.program().period_or_duty, 32);

        timer.arm();
        assert_eq!(timer.set_window(Duration::from_millis(64)), Err(PortError::InvalidConfig));
        assert_eq!(timer.timeout(), WatchdogTimeout::Ms32);
    }
}
