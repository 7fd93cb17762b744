//! Limit switch debouncing through the pin-change and watchdog path

use std::cell::Cell;

use grbl_port_core::board::ARDUINO_UNO;
use grbl_port_core::clock::{WatchdogTimeout, TICKS_PER_MILLISECOND};
use grbl_port_core::hal::Duration;
use grbl_port_core::machine::zen_toolworks_7x7;
use grbl_port_core::test_utils::bench::{Bench, Vector};
use grbl_port_core::{Axis, AxisMask, PortError, PortId, PortSettings};

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = TICKS_PER_MILLISECOND as u64;

    std::thread_local! {
        static TRIPPED: Cell<Option<AxisMask>> = const { Cell::new(None) };
    }

    /// Debounce callback: sample the limit group once the window closes
    fn check_limits() {
        let bench = Bench::current();
        TRIPPED.with(|t| t.set(Some(bench.p.limit_state(&bench.map, &bench.settings))));
    }

    fn limit_bench() -> &'static Bench {
        TRIPPED.with(|t| t.set(None));
        let bench = Bench::install(ARDUINO_UNO, PortSettings::from_profile(&zen_toolworks_7x7::PROFILE));
        bench.p.debounce.register_callback(check_limits);
        bench
    }

    /// Pin-change vector stand-in: open a window on every notified edge
    fn switch_edge(bench: &Bench, at: u64, mask: u8, level: u8) -> bool {
        bench.clock.set(at);
        if bench.p.gpio.registers().drive(PortId::B, mask, level) {
            bench.p.debounce.arm()
        } else {
            false
        }
    }

    #[test]
    fn test_bouncing_switch_reads_once_after_window() {
        let bench = limit_bench();
        let y = ARDUINO_UNO.limit.member_mask(1);

        assert!(switch_edge(bench, MS, y, 0));
        // Contact bounce while the window is open
        assert!(!switch_edge(bench, 2 * MS, y, y));
        assert!(!switch_edge(bench, 3 * MS, y, 0));
        assert!(!switch_edge(bench, 6 * MS, y, y));
        assert!(!switch_edge(bench, 7 * MS, y, 0));
        assert_eq!(TRIPPED.with(|t| t.get()), None);

        assert_eq!(bench.next_vector(), Some((Vector::Debounce, 33 * MS)));
        assert_eq!(bench.run_until(100 * MS), 1);
        let tripped = TRIPPED.with(|t| t.get()).unwrap();
        assert!(tripped.contains(Axis::Y));
        assert!(!tripped.contains(Axis::X));
        assert!(!tripped.contains(Axis::Z));
        assert_eq!(bench.p.debounce.fire_count(), 1);
    }

    #[test]
    fn test_switch_released_within_window_reads_clear() {
        let bench = limit_bench();
        let x = ARDUINO_UNO.limit.member_mask(0);

        assert!(switch_edge(bench, 0, x, 0));
        assert!(!switch_edge(bench, 4 * MS, x, x));
        bench.run_until(50 * MS);

        assert_eq!(TRIPPED.with(|t| t.get()), Some(AxisMask::NONE));
    }

    #[test]
    fn test_window_reopens_after_expiry() {
        let bench = limit_bench();
        let z = ARDUINO_UNO.limit.member_mask(2);

        assert!(switch_edge(bench, 0, z, 0));
        bench.run_until(40 * MS);
        assert!(!bench.p.debounce.is_armed());

        assert!(switch_edge(bench, 50 * MS, z, z));
        assert_eq!(bench.next_vector(), Some((Vector::Debounce, 82 * MS)));
        bench.run_until(90 * MS);
        assert_eq!(bench.p.debounce.fire_count(), 2);
        assert_eq!(TRIPPED.with(|t| t.get()), Some(AxisMask::NONE));
    }

    #[test]
    fn test_masked_group_raises_no_edge() {
        let bench = limit_bench();
        bench.p.gpio.enable_change_interrupt(&ARDUINO_UNO.limit, false);
        assert!(!switch_edge(bench, MS, ARDUINO_UNO.limit.mask, 0));
        assert_eq!(bench.next_vector(), None);
    }

    #[test]
    fn test_longer_window_needs_idle_timer() {
        let bench = limit_bench();
        assert!(bench.p.debounce.arm());
        assert_eq!(bench.p.debounce.set_window(Duration::from_millis(100)), Err(PortError::InvalidConfig));

        bench.p.debounce.disarm();
        assert_eq!(bench.p.debounce.set_window(Duration::from_millis(100)), Ok(WatchdogTimeout::Ms125));
        assert!(switch_edge(bench, MS, ARDUINO_UNO.limit.member_mask(0), 0));
        assert_eq!(bench.next_vector(), Some((Vector::Debounce, 126 * MS)));
    }
}
