//! Settings consumed by the port layer

use crate::clock::{reset_ticks_for_us, WatchdogTimeout, TICKS_PER_MICROSECOND};
use crate::hal::{Duration, PortError};
use crate::machine::MachineProfile;
use crate::ports::PortMap;
use crate::timer::PwmRange;
use crate::types::{AxisMask, InvertMask, PullupMask};

/// Limit switch debounce window, matching the watchdog's 32 ms timeout
pub const LIMIT_DEBOUNCE_MS: u64 = 32;

/// Read-only view of the settings store used by this layer
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PortSettings {
    /// `$2`
    pub step_invert: AxisMask,
    /// `$3`
    pub dir_invert: AxisMask,
    /// `$4`
    pub invert_st_enable: bool,
    /// `$5`
    pub invert_limit_pins: bool,
    /// `$6`
    pub invert_probe_pin: bool,
    pub limit_pullups: bool,
    pub control_pullups: bool,
    pub probe_pullup: bool,
    pub spindle_pwm: PwmRange,
    /// `$0`
    pub step_pulse_us: u8,
    /// `$1`; `None` keeps the steppers enabled.
    ///
    /// Read by the stepper layer when it decides to release the drivers.
    pub stepper_idle_lock: Option<Duration>,
    pub debounce_delay: Duration,
}

impl PortSettings {
    /// Factory settings of a machine profile
    pub fn from_profile(profile: &MachineProfile) -> Self {
        let stepper_idle_lock = if profile.stepper_idle_lock_ms == MachineProfile::IDLE_LOCK_ALWAYS {
            None
        } else {
            Some(Duration::from_millis(profile.stepper_idle_lock_ms as u64))
        };
        Self {
            step_invert: profile.step_invert_mask,
            dir_invert: profile.dir_invert_mask,
            invert_st_enable: profile.invert_st_enable,
            invert_limit_pins: profile.invert_limit_pins,
            invert_probe_pin: profile.invert_probe_pin,
            limit_pullups: true,
            control_pullups: true,
            probe_pullup: true,
            spindle_pwm: PwmRange::DEFAULT,
            step_pulse_us: profile.step_pulse_us,
            stepper_idle_lock,
            debounce_delay: Duration::from_millis(LIMIT_DEBOUNCE_MS),
        }
    }

    /// Check the settings before they reach the hardware
    pub fn validate(&self) -> Result<(), PortError> {
        self.spindle_pwm.validate(u8::MAX as u16)?;
        let debounce = self.debounce_delay.as_millis();
        if debounce == 0 || debounce > WatchdogTimeout::S8.millis() as u64 {
            return Err(PortError::InvalidConfig);
        }
        Ok(())
    }

    /// STEP invert bits in port positions
    pub fn step_invert_bits(&self, map: &PortMap) -> InvertMask {
        InvertMask(map.step.spread(self.step_invert))
    }

    /// DIRECTION invert bits in port positions
    pub fn dir_invert_bits(&self, map: &PortMap) -> InvertMask {
        InvertMask(map.direction.spread(self.dir_invert))
    }

    /// LIMIT bits to flip so a triggered switch reads as 1.
    ///
    /// Switches pull the pins low against the pull-ups, so the raw bits
    /// are inverted unless `$5` asks for the opposite.
    pub fn limit_invert_bits(&self, map: &PortMap) -> InvertMask {
        if self.invert_limit_pins {
            InvertMask(0)
        } else {
            InvertMask(map.limit.mask)
        }
    }

    /// CONTROL bits to flip so a pressed button reads as 1
    pub fn control_invert_bits(&self, map: &PortMap) -> InvertMask {
        InvertMask(map.control.mask)
    }

    /// LIMIT bits to pull up
    pub fn limit_pullup_bits(&self, map: &PortMap) -> PullupMask {
        PullupMask(if self.limit_pullups { map.limit.mask } else { 0 })
    }

    /// CONTROL bits to pull up
    pub fn control_pullup_bits(&self, map: &PortMap) -> PullupMask {
        PullupMask(if self.control_pullups { map.control.mask } else { 0 })
    }

    /// Step pulse width in CPU cycles
    pub fn step_pulse_cycles(&self) -> u32 {
        self.step_pulse_us as u32 * TICKS_PER_MICROSECOND
    }

    /// Reset Timer delay for the configured pulse width
    pub fn reset_ticks(&self) -> u16 {
        reset_ticks_for_us(self.step_pulse_us as u16)
    }

    /// Debounce Timer timeout covering the configured delay
    pub fn debounce_timeout(&self) -> WatchdogTimeout {
        WatchdogTimeout::covering(self.debounce_delay.as_millis())
    }

    /// Reject a step period the configured pulse would not fit into
    pub fn check_pulse_fits(&self, period_cycles: u32) -> Result<(), PortError> {
        if self.step_pulse_cycles() >= period_cycles {
            Err(PortError::PulseWidthExceedsPeriod)
        } else {
            Ok(())
        }
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self::from_profile(&crate::machine::SELECTED)
    }
}
