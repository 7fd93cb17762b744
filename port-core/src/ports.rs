//! Virtual Port Model: logical pin groups and singleton pins of a board
//!
//! A [`PortMap`] is compiled-in wiring. Lookups are `const fn`, so a pin
//! that a machine does not wire fails the build when resolved in a
//! `const` item instead of falling back at runtime.

use crate::types::{Descriptor, PinDescriptor, PortId, VirtualPortDescriptor};

/// Named pin groups manipulated as a unit
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VirtualPort {
    /// Step pulse outputs, one bit per axis
    Step,
    /// Stepper direction outputs, one bit per axis
    Direction,
    /// Limit switch inputs, one bit per axis
    Limit,
    /// User control inputs (reset, feed hold, cycle start)
    Control,
}

impl VirtualPort {
    pub const ALL: [VirtualPort; 4] = [
        VirtualPort::Step,
        VirtualPort::Direction,
        VirtualPort::Limit,
        VirtualPort::Control,
    ];
}

/// Named singleton pins
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pin {
    SteppersDisable,
    Probe,
    CoolantFlood,
    CoolantMist,
    SpindleEnable,
    SpindleDirection,
    SpindlePwm,
}

impl Pin {
    pub const COUNT: usize = 7;
    pub const ALL: [Pin; Pin::COUNT] = [
        Pin::SteppersDisable,
        Pin::Probe,
        Pin::CoolantFlood,
        Pin::CoolantMist,
        Pin::SpindleEnable,
        Pin::SpindleDirection,
        Pin::SpindlePwm,
    ];
}

/// Logical name of anything on the board
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    Port(VirtualPort),
    Pin(Pin),
}

/// Bit positions inside the CONTROL group
pub mod control {
    pub const RESET: usize = 0;
    pub const FEED_HOLD: usize = 1;
    pub const CYCLE_START: usize = 2;
}

/// Board wiring: every virtual port and the singleton pins it provides
#[derive(Copy, Clone, Debug)]
pub struct PortMap {
    pub name: &'static str,
    pub step: VirtualPortDescriptor,
    pub direction: VirtualPortDescriptor,
    pub limit: VirtualPortDescriptor,
    pub control: VirtualPortDescriptor,
    /// Indexed by `Pin as usize`; `None` when the board does not wire it
    pub pins: [Option<PinDescriptor>; Pin::COUNT],
}

impl PortMap {
    /// Resolve a virtual port
    pub const fn port(&self, port: VirtualPort) -> VirtualPortDescriptor {
        match port {
            VirtualPort::Step => self.step,
            VirtualPort::Direction => self.direction,
            VirtualPort::Limit => self.limit,
            VirtualPort::Control => self.control,
        }
    }

    /// Resolve a singleton pin at build time.
    ///
    /// Meant for `const` items, where an unwired `pin` is a compile
    /// error. Runtime code goes through [`try_pin`](Self::try_pin).
    pub const fn pin(&self, pin: Pin) -> PinDescriptor {
        match self.pins[pin as usize] {
            Some(descriptor) => descriptor,
            None => panic!("pin is not wired on this board"),
        }
    }

    /// Resolve a singleton pin the board may leave unwired
    pub const fn try_pin(&self, pin: Pin) -> Option<PinDescriptor> {
        self.pins[pin as usize]
    }

    /// Whether the board wires `pin`
    pub const fn has_pin(&self, pin: Pin) -> bool {
        self.pins[pin as usize].is_some()
    }

    /// Resolve any logical name at build time, see [`pin`](Self::pin)
    pub const fn resolve(&self, signal: Signal) -> Descriptor {
        match signal {
            Signal::Port(port) => Descriptor::Port(self.port(port)),
            Signal::Pin(pin) => Descriptor::Pin(self.pin(pin)),
        }
    }

    /// Resolve any logical name; `None` for a pin the board leaves unwired
    pub const fn try_resolve(&self, signal: Signal) -> Option<Descriptor> {
        match signal {
            Signal::Port(port) => Some(Descriptor::Port(self.port(port))),
            Signal::Pin(pin) => match self.try_pin(pin) {
                Some(descriptor) => Some(Descriptor::Pin(descriptor)),
                None => None,
            },
        }
    }

    /// Check the wiring invariants; meant for `const _: () = MAP.check();`
    ///
    /// - a singleton bit is unique within its port,
    /// - no group overlaps another group or a singleton on the same port.
    pub const fn check(&self) {
        let groups = [self.step, self.direction, self.limit, self.control];

        let mut i = 0;
        while i < groups.len() {
            let mut j = i + 1;
            while j < groups.len() {
                if groups[i].port.same_as(groups[j].port) {
                    assert!(groups[i].mask & groups[j].mask == 0, "virtual ports overlap");
                }
                j += 1;
            }
            i += 1;
        }

        let mut p = 0;
        while p < Pin::COUNT {
            if let Some(pin) = self.pins[p] {
                let mut g = 0;
                while g < groups.len() {
                    if groups[g].port.same_as(pin.port) {
                        assert!(groups[g].mask & pin.mask() == 0, "pin overlaps a virtual port");
                    }
                    g += 1;
                }
                let mut q = p + 1;
                while q < Pin::COUNT {
                    if let Some(other) = self.pins[q] {
                        if other.port.same_as(pin.port) {
                            assert!(other.bit != pin.bit, "two pins share one bit");
                        }
                    }
                    q += 1;
                }
            }
            p += 1;
        }
    }

    /// Union of every bit the map claims on `port`
    pub const fn claimed(&self, port: PortId) -> u8 {
        let groups = [self.step, self.direction, self.limit, self.control];
        let mut bits = 0;
        let mut g = 0;
        while g < groups.len() {
            if groups[g].port.same_as(port) {
                bits |= groups[g].mask;
            }
            g += 1;
        }
        let mut p = 0;
        while p < Pin::COUNT {
            if let Some(pin) = self.pins[p] {
                if pin.port.same_as(port) {
                    bits |= pin.mask();
                }
            }
            p += 1;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ARDUINO_UNO;
    use crate::types::IoDir;

    // Resolved at build time; an unwired pin here would not compile.
    const PROBE: PinDescriptor = ARDUINO_UNO.pin(Pin::Probe);
    const STEP: VirtualPortDescriptor = ARDUINO_UNO.port(VirtualPort::Step);

    #[test]
    fn test_const_resolution() {
        assert_eq!(PROBE.port, PortId::C);
        assert_eq!(PROBE.dir, IoDir::Input);
        assert_eq!(STEP.mask, 0b0001_1100);
    }

    #[test]
    fn test_resolve_signal() {
        match ARDUINO_UNO.resolve(Signal::Port(VirtualPort::Limit)) {
            Descriptor::Port(p) => assert_eq!(p.name, "LIMIT"),
            Descriptor::Pin(_) => panic!("expected a virtual port"),
        }
        match ARDUINO_UNO.resolve(Signal::Pin(Pin::SpindlePwm)) {
            Descriptor::Pin(p) => assert_eq!(p.bit, 3),
            Descriptor::Port(_) => panic!("expected a pin"),
        }
    }

    #[test]
    fn test_unwired_pin_reported() {
        assert!(!ARDUINO_UNO.has_pin(Pin::SpindleDirection));
        assert!(ARDUINO_UNO.has_pin(Pin::SpindleEnable));
    }

    #[test]
    #[should_panic(expected = "not wired")]
    fn test_unwired_pin_panics_outside_const() {
        let _ = ARDUINO_UNO.pin(Pin::SpindleDirection);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_overlapping_groups_rejected() {
        let mut map = ARDUINO_UNO;
        map.limit = VirtualPortDescriptor::new("LIMIT", PortId::D, IoDir::Input, &[4, 5]);
        map.check();
    }

    #[test]
    #[should_panic(expected = "pin overlaps")]
    fn test_pin_inside_group_rejected() {
        let mut map = ARDUINO_UNO;
        // D2 is the X step bit
        map.pins[Pin::CoolantFlood as usize] = Some(PinDescriptor::output("COOLANT_FLOOD", PortId::D, 2));
        map.check();
    }

    #[test]
    #[should_panic(expected = "share one bit")]
    fn test_pins_on_same_bit_rejected() {
        let mut map = ARDUINO_UNO;
        map.pins[Pin::CoolantMist as usize] = Some(PinDescriptor::output("COOLANT_MIST", PortId::C, 3));
        map.check();
    }

    #[test]
    fn test_try_resolve_unwired_pin() {
        assert_eq!(ARDUINO_UNO.try_resolve(Signal::Pin(Pin::SpindleDirection)), None);
        assert_eq!(ARDUINO_UNO.try_pin(Pin::SpindleDirection), None);
        match ARDUINO_UNO.try_resolve(Signal::Pin(Pin::Probe)) {
            Some(Descriptor::Pin(p)) => assert_eq!(p, PROBE),
            other => panic!("expected the probe pin, got {:?}", other),
        }
        assert!(matches!(
            ARDUINO_UNO.try_resolve(Signal::Port(VirtualPort::Step)),
            Some(Descriptor::Port(p)) if p.mask == STEP.mask
        ));
    }

    #[test]
    fn test_claimed_bits() {
        assert_eq!(ARDUINO_UNO.claimed(PortId::D), 0b1111_1100);
        assert_eq!(ARDUINO_UNO.claimed(PortId::B), 0b0011_1111);
        assert_eq!(ARDUINO_UNO.claimed(PortId::C), 0b0011_1111);
    }
}
