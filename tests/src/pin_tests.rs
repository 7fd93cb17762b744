//! Singleton pins through the `embedded-hal` digital traits

use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};

use grbl_port_core::board::ARDUINO_UNO;
use grbl_port_core::hal::mock::{SimClock, SimHal};
use grbl_port_core::machine::{bobs_cnc_e4, pocket_nc_fr4};
use grbl_port_core::ports::Pin;
use grbl_port_core::{PortError, PortId, PortSettings, Peripherals};

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive any output pin high and back low through embedded-hal
    fn toggle<P: OutputPin + StatefulOutputPin>(pin: &mut P) -> (bool, bool) {
        pin.set_high().ok();
        let high = pin.is_set_high().unwrap_or(false);
        pin.set_low().ok();
        let low = pin.is_set_low().unwrap_or(false);
        (high, low)
    }

    #[test]
    fn test_coolant_pins_toggle() {
        let clock = SimClock::new();
        let p = Peripherals::new(SimHal::new(&clock));
        p.init(&ARDUINO_UNO, &PortSettings::from_profile(&bobs_cnc_e4::PROFILE)).unwrap();

        let mut flood = p.gpio.pin(ARDUINO_UNO.pin(Pin::CoolantFlood));
        assert_eq!(toggle(&mut flood), (true, true));

        let mut mist = p.gpio.pin(ARDUINO_UNO.pin(Pin::CoolantMist));
        mist.set_high().unwrap();
        // C4 high, C3 back low, control inputs still pulled up
        assert_eq!(p.gpio.registers().levels(PortId::C) & 0b0001_1000, 0b0001_0000);
        assert_eq!(p.gpio.read(&ARDUINO_UNO.control), ARDUINO_UNO.control.mask);
    }

    #[test]
    fn test_probe_pin_reads_external_level() {
        let clock = SimClock::new();
        let p = Peripherals::new(SimHal::new(&clock));
        p.init(&ARDUINO_UNO, &PortSettings::from_profile(&pocket_nc_fr4::PROFILE)).unwrap();

        let probe = ARDUINO_UNO.pin(Pin::Probe);
        let mut handle = p.gpio.pin(probe);
        assert!(handle.is_high().unwrap());
        assert_eq!(handle.set_high(), Err(PortError::WrongDirection));

        p.gpio.registers().drive(PortId::C, probe.mask(), 0);
        assert!(handle.is_low().unwrap());
        // Active-low probe touching the work
        assert!(p.gpio.is_active(&probe, false));
        assert!(!p.gpio.is_active(&probe, true));
    }

    #[test]
    fn test_spindle_enable_is_separate_from_pwm_pin() {
        let clock = SimClock::new();
        let p = Peripherals::new(SimHal::new(&clock));
        p.init(&ARDUINO_UNO, &PortSettings::from_profile(&bobs_cnc_e4::PROFILE)).unwrap();
        assert!(!ARDUINO_UNO.has_pin(Pin::SpindleDirection));

        let enable = ARDUINO_UNO.pin(Pin::SpindleEnable);
        p.gpio.set_active(&enable, true, false);
        p.spindle.set_duty(90);
        p.spindle.enable(true);

        assert!(p.gpio.read_pin(&enable));
        assert!(!p.gpio.read_pin(&ARDUINO_UNO.pin(Pin::SpindlePwm)));
        assert_eq!(p.spindle.hardware().output_duty(), 90);
    }
}
