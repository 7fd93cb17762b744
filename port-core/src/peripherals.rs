//! Peripherals aggregate: the GPIO Engine and every timer of one back-end

use crate::gpio::Gpio;
use crate::hal::{PortError, PortHal};
use crate::ports::{Pin, PortMap};
use crate::serial::{Serial, BAUD_RATE};
use crate::settings::PortSettings;
use crate::timer::{DebounceTimer, PulseTimer, ResetTimer, SpindlePwm};
use crate::types::AxisMask;

/// Singleton outputs driven low at init
const IDLE_LOW_OUTPUTS: [Pin; 5] = [
    Pin::SpindleEnable,
    Pin::SpindleDirection,
    Pin::SpindlePwm,
    Pin::CoolantFlood,
    Pin::CoolantMist,
];

/// Every component of the port layer built on one back-end
pub struct Peripherals<H: PortHal> {
    pub gpio: Gpio<H::Ports>,
    pub pulse: PulseTimer<H::Pulse>,
    pub reset: ResetTimer<H::Reset>,
    pub spindle: SpindlePwm<H::Spindle>,
    pub debounce: DebounceTimer<H::Debounce>,
    pub serial: Serial<H::Serial>,
}

impl<H: PortHal> Peripherals<H> {
    pub fn new(hal: H) -> Self {
        let parts = hal.split();
        Self {
            gpio: Gpio::new(parts.ports),
            pulse: PulseTimer::new(parts.pulse),
            reset: ResetTimer::new(parts.reset),
            spindle: SpindlePwm::new(parts.spindle),
            debounce: DebounceTimer::new(parts.debounce),
            serial: Serial::new(parts.serial),
        }
    }

    /// Bring every pin and timer to its power-up state
    pub fn init(&self, map: &PortMap, settings: &PortSettings) -> Result<(), PortError> {
        settings.validate()?;

        // Stepper outputs at their idle levels, drivers disabled
        self.gpio.init(map.step);
        self.gpio.write_logical(&map.step, 0, settings.step_invert_bits(map));
        self.gpio.init(map.direction);
        self.gpio.write_logical(&map.direction, 0, settings.dir_invert_bits(map));
        if let Some(disable) = map.try_pin(Pin::SteppersDisable) {
            self.gpio.init(disable);
            self.gpio.set_active(&disable, true, settings.invert_st_enable);
        }

        // Switch inputs
        self.gpio.init(map.limit);
        self.gpio.set_pullup_mask(&map.limit, settings.limit_pullup_bits(map));
        self.gpio.init(map.control);
        self.gpio.set_pullup_mask(&map.control, settings.control_pullup_bits(map));
        if let Some(probe) = map.try_pin(Pin::Probe) {
            self.gpio.init(probe);
            self.gpio.set_pullup(probe, settings.probe_pullup);
        }
        self.gpio.enable_change_interrupt(&map.limit, true);
        self.gpio.enable_change_interrupt(&map.control, true);

        for pin in IDLE_LOW_OUTPUTS {
            if let Some(pin) = map.try_pin(pin) {
                self.gpio.init(pin);
                self.gpio.write_pin(&pin, false);
            }
        }

        self.pulse.init();
        self.reset.init();
        self.spindle.init(settings.spindle_pwm)?;
        self.debounce.init(settings.debounce_timeout());
        self.serial.init(BAUD_RATE);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "⚙️ Port layer ready on {}: pulse {}us, debounce {}",
            map.name,
            settings.step_pulse_us,
            settings.debounce_timeout()
        );

        Ok(())
    }

    /// Triggered limit switches, one bit per axis
    pub fn limit_state(&self, map: &PortMap, settings: &PortSettings) -> AxisMask {
        let levels = self.gpio.read_logical(&map.limit, settings.limit_invert_bits(map));
        map.limit.collapse(levels)
    }

    /// Pressed control buttons, indexed by the [`control`](crate::ports::control) positions
    pub fn control_state(&self, map: &PortMap, settings: &PortSettings) -> u8 {
        let levels = self.gpio.read_logical(&map.control, settings.control_invert_bits(map));
        map.control.collapse(levels).0
    }

    /// Whether the probe touches the work; `false` on boards without one
    pub fn probe_triggered(&self, map: &PortMap, settings: &PortSettings) -> bool {
        match map.try_pin(Pin::Probe) {
            Some(probe) => self.gpio.is_active(&probe, settings.invert_probe_pin),
            None => false,
        }
    }

    /// Stop all timer activity and switch the spindle output off
    pub fn go_idle(&self) {
        self.pulse.stop();
        self.reset.disarm();
        self.debounce.disarm();
        self.spindle.enable(false);

        #[cfg(feature = "defmt")]
        defmt::debug!("💤 Port layer idle");
    }
}
