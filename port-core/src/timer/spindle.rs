//! Variable Spindle Timer: PWM duty output

use core::cell::Cell;
use critical_section::Mutex;

use super::{ProgramCell, TimerMode, TimerProgram};
use crate::hal::{PortError, PwmCounter};

/// Spindle PWM limits in duty units
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmRange {
    /// Duty written when the spindle is off
    pub off: u16,
    /// Lowest duty that keeps the spindle turning
    pub min: u16,
    /// Duty at maximum speed
    pub max: u16,
}

impl PwmRange {
    /// Full 8-bit range: off 0, min 1, max 255
    pub const DEFAULT: PwmRange = PwmRange { off: 0, min: 1, max: 255 };

    /// Check `off <= min <= max <= counter_max`
    pub const fn validate(&self, counter_max: u16) -> Result<(), PortError> {
        if self.off <= self.min && self.min <= self.max && self.max <= counter_max {
            Ok(())
        } else {
            Err(PortError::InvalidPwmRange)
        }
    }

    /// Saturate `duty` into `[off, max]`
    pub const fn clamp(&self, duty: u16) -> u16 {
        if duty < self.off {
            self.off
        } else if duty > self.max {
            self.max
        } else {
            duty
        }
    }
}

impl Default for PwmRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Spindle speed PWM. Register-only, no interrupt.
pub struct SpindlePwm<C> {
    hw: C,
    range: Mutex<Cell<PwmRange>>,
    program: ProgramCell,
}

impl<C: PwmCounter> SpindlePwm<C> {
    pub const fn new(hw: C) -> Self {
        Self {
            hw,
            range: Mutex::new(Cell::new(PwmRange::DEFAULT)),
            program: ProgramCell::new(TimerMode::Pwm),
        }
    }

    /// Fast PWM mode, output disconnected, duty at the off value
    pub fn init(&self, range: PwmRange) -> Result<(), PortError> {
        range.validate(C::MAX_DUTY)?;
        critical_section::with(|cs| {
            self.hw.init();
            self.hw.connect_output(false);
            self.hw.set_compare(range.off);
            self.range.borrow(cs).set(range);
            self.program.set(
                cs,
                TimerProgram {
                    mode: TimerMode::Pwm,
                    period_or_duty: range.off as u32,
                    enabled: false,
                },
            );
        });
        Ok(())
    }

    /// Replace the duty limits; the stored duty is re-clamped
    pub fn set_range(&self, range: PwmRange) -> Result<(), PortError> {
        range.validate(C::MAX_DUTY)?;
        critical_section::with(|cs| {
            self.range.borrow(cs).set(range);
            let duty = range.clamp(self.program.get().period_or_duty as u16);
            self.hw.set_compare(duty);
            self.program.update(cs, |p| p.period_or_duty = duty as u32);
        });
        Ok(())
    }

    /// Set the duty, saturated into `[off, max]`. Returns the duty applied.
    pub fn set_duty(&self, duty: u16) -> u16 {
        critical_section::with(|cs| {
            let duty = self.range.borrow(cs).get().clamp(duty);
            self.hw.set_compare(duty);
            self.program.update(cs, |p| p.period_or_duty = duty as u32);
            duty
        })
    }

    /// Connect or disconnect the output; the duty is kept
    pub fn enable(&self, enable: bool) {
        critical_section::with(|cs| {
            self.hw.connect_output(enable);
            self.program.update(cs, |p| p.enabled = enable);
        });
    }

    /// Whether the compare output drives the pin
    pub fn is_enabled(&self) -> bool {
        self.hw.output_connected()
    }

    pub fn duty(&self) -> u16 {
        self.program.get().period_or_duty as u16
    }

    pub fn range(&self) -> PwmRange {
        critical_section::with(|cs| self.range.borrow(cs).get())
    }

    pub fn program(&self) -> TimerProgram {
        self.program.get()
    }

    pub fn hardware(&self) -> &C {
        &self.hw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::SimPwmCounter;

    fn spindle() -> SpindlePwm<SimPwmCounter> {
        let pwm = SpindlePwm::new(SimPwmCounter::new());
        pwm.init(PwmRange { off: 5, min: 10, max: 200 }).unwrap();
        pwm
    }

    #[test]
    fn test_init_leaves_output_off() {
        let pwm = spindle();
        assert!(!pwm.is_enabled());
        assert_eq!(pwm.duty(), 5);
        assert_eq!(pwm.hardware().compare(), 5);
    }

    #[test]
    fn test_set_duty_clamps() {
        let pwm = spindle();
        assert_eq!(pwm.set_duty(0), 5);
        assert_eq!(pwm.set_duty(4), 5);
        assert_eq!(pwm.set_duty(5), 5);
        assert_eq!(pwm.set_duty(120), 120);
        assert_eq!(pwm.set_duty(200), 200);
        assert_eq!(pwm.set_duty(201), 200);
        assert_eq!(pwm.set_duty(u16::MAX), 200);
        assert_eq!(pwm.hardware().compare(), 200);
    }

    #[test]
    fn test_disable_enable_restores_duty() {
        let pwm = spindle();
        pwm.set_duty(150);
        pwm.enable(true);
        assert!(pwm.is_enabled());
        assert_eq!(pwm.hardware().output_duty(), 150);

        pwm.enable(false);
        assert!(!pwm.is_enabled());
        assert_eq!(pwm.hardware().output_duty(), 0);

        pwm.enable(true);
        assert_eq!(pwm.duty(), 150);
        assert_eq!(pwm.hardware().output_duty(), 150);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let pwm = SpindlePwm::new(SimPwmCounter::new());
        assert_eq!(pwm.init(PwmRange { off: 10, min: 5, max: 200 }), Err(PortError::InvalidPwmRange));
        assert_eq!(pwm.init(PwmRange { off: 0, min: 1, max: 300 }), Err(PortError::InvalidPwmRange));
        assert!(pwm.init(PwmRange::DEFAULT).is_ok());
    }

    #[test]
    fn test_set_range_reclamps_duty() {
        let pwm = spindle();
        pwm.set_duty(180);
        pwm.set_range(PwmRange { off: 0, min: 1, max: 100 }).unwrap();
        assert_eq!(pwm.duty(), 100);
        assert_eq!(pwm.hardware().compare(), 100);
    }
}
