//! Board wiring maps

use crate::ports::PortMap;
use crate::types::{IoDir, PinDescriptor, PortId, Polarity, VirtualPortDescriptor};

/// Arduino Uno (ATmega328P) with variable spindle.
///
/// The PWM output takes D11, so the Z limit moves to D12 and the spindle
/// enable uses D13. Spindle direction is not available on this wiring.
pub const ARDUINO_UNO: PortMap = PortMap {
    name: "arduino-atmega328p",
    // Digital pins 2, 3, 4
    step: VirtualPortDescriptor::new("STEP", PortId::D, IoDir::Output, &[2, 3, 4]),
    // Digital pins 5, 6, 7
    direction: VirtualPortDescriptor::new("DIRECTION", PortId::D, IoDir::Output, &[5, 6, 7]),
    // Digital pins 9, 10, 12
    limit: VirtualPortDescriptor::new("LIMIT", PortId::B, IoDir::Input, &[1, 2, 4]),
    // Analog pins 0, 1, 2: reset, feed hold, cycle start
    control: VirtualPortDescriptor::new("CONTROL", PortId::C, IoDir::Input, &[0, 1, 2]),
    pins: [
        // Digital pin 8
        Some(PinDescriptor::new("STEPPERS_DISABLE", PortId::B, 0, IoDir::Output, Polarity::ActiveHigh)),
        // Analog pin 5
        Some(PinDescriptor::new("PROBE", PortId::C, 5, IoDir::Input, Polarity::ActiveLow)),
        // Analog pin 3
        Some(PinDescriptor::output("COOLANT_FLOOD", PortId::C, 3)),
        // Analog pin 4
        Some(PinDescriptor::output("COOLANT_MIST", PortId::C, 4)),
        // Digital pin 13
        Some(PinDescriptor::output("SPINDLE_ENABLE", PortId::B, 5)),
        None,
        // Digital pin 11, OC2A
        Some(PinDescriptor::output("SPINDLE_PWM", PortId::B, 3)),
    ],
};

const _: () = ARDUINO_UNO.check();
