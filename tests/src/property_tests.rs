//! Property checks over the timer arithmetic and port writes

use proptest::prelude::*;

use grbl_port_core::board::ARDUINO_UNO;
use grbl_port_core::clock::{reset_ticks_for_us, PulsePeriod, TICKS_PER_MICROSECOND, TICKS_PER_MILLISECOND};
use grbl_port_core::hal::mock::{SimClock, SimHal};
use grbl_port_core::hal::{PortRegister, PortRegisters};
use grbl_port_core::machine::bobs_cnc_e4;
use grbl_port_core::{Peripherals, PortId, PortSettings, PwmRange};

#[cfg(test)]
mod tests {
    use super::*;

    fn pwm_range() -> impl Strategy<Value = PwmRange> {
        (0u16..=255, 0u16..=255, 0u16..=255).prop_map(|(a, b, c)| {
            let mut v = [a, b, c];
            v.sort_unstable();
            PwmRange { off: v[0], min: v[1], max: v[2] }
        })
    }

    proptest! {
        #[test]
        fn prop_spindle_duty_saturates(range in pwm_range(), duty in any::<u16>()) {
            let clock = SimClock::new();
            let p = Peripherals::new(SimHal::new(&clock));
            let mut settings = PortSettings::from_profile(&bobs_cnc_e4::PROFILE);
            settings.spindle_pwm = range;
            p.init(&ARDUINO_UNO, &settings).unwrap();

            let applied = p.spindle.set_duty(duty);
            prop_assert!(applied >= range.off && applied <= range.max);
            if duty >= range.off && duty <= range.max {
                prop_assert_eq!(applied, duty);
            }
            prop_assert_eq!(p.spindle.hardware().compare(), applied);
        }

        #[test]
        fn prop_port_write_touches_only_members(others in any::<u8>(), bits in any::<u8>()) {
            let clock = SimClock::new();
            let p = Peripherals::new(SimHal::new(&clock));
            p.init(&ARDUINO_UNO, &PortSettings::from_profile(&bobs_cnc_e4::PROFILE)).unwrap();
            let regs = p.gpio.registers();
            let step = ARDUINO_UNO.step;

            let seeded = (others & !step.mask) | (regs.output(PortId::D) & step.mask);
            regs.write(PortId::D, PortRegister::Output, seeded);
            p.gpio.write(&step, bits);

            let after = regs.output(PortId::D);
            prop_assert_eq!(after & !step.mask, seeded & !step.mask);
            prop_assert_eq!(after & step.mask, bits & step.mask);
        }

        #[test]
        fn prop_pulse_period_within_one_prescaler_tick(cycles in 1u32..=PulsePeriod::MAX_CYCLES) {
            let period = PulsePeriod::from_cycles(cycles);
            prop_assert!(period.cycles() <= cycles);
            prop_assert!(cycles - period.cycles() < period.prescaler.divisor());
        }

        #[test]
        fn prop_reset_ticks_never_exceed_pulse(us in 0u16..=255) {
            let ticks = reset_ticks_for_us(us);
            prop_assert!(ticks >= 1);
            if us > 2 {
                prop_assert!(ticks as u32 * 8 <= us as u32 * TICKS_PER_MICROSECOND);
            }
        }

        #[test]
        fn prop_edges_inside_window_fire_once(gaps in prop::collection::vec(1u64..4, 1..10)) {
            let clock = SimClock::new();
            let p = Peripherals::new(SimHal::new(&clock));
            p.init(&ARDUINO_UNO, &PortSettings::from_profile(&bobs_cnc_e4::PROFILE)).unwrap();
            let ms = TICKS_PER_MILLISECOND as u64;

            prop_assert!(p.debounce.arm());
            let mut t = 0;
            for gap in gaps {
                t += gap * ms;
                if t >= 32 * ms {
                    break;
                }
                clock.set(t);
                prop_assert!(!p.debounce.arm());
            }

            let expiry = p.debounce.hardware().next_expiry().unwrap();
            prop_assert_eq!(expiry, 32 * ms);
            clock.set(expiry);
            p.debounce.on_interrupt();
            p.debounce.on_interrupt();
            prop_assert_eq!(p.debounce.fire_count(), 1);
            prop_assert_eq!(p.debounce.hardware().next_expiry(), None);
        }
    }
}
