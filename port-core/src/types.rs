//! Core data types for pin descriptors and virtual ports

/// Physical I/O port (bank) identifier
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortId {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl PortId {
    /// Number of ports a back-end may expose
    pub const COUNT: usize = 6;

    /// Zero-based index of this port
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Compile-time friendly equality
    pub const fn same_as(&self, other: PortId) -> bool {
        *self as u8 == other as u8
    }
}

/// Pin direction, fixed at configuration time
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoDir {
    /// Configure the pin as input.
    Input,
    /// Configure the pin as output.
    Output,
}

impl IoDir {
    pub const fn is_output(&self) -> bool {
        matches!(self, IoDir::Output)
    }
}

/// Electrical level that means "active" for a pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Returns the polarity with the invert flag applied
    pub const fn inverted_if(self, invert: bool) -> Polarity {
        match (self, invert) {
            (p, false) => p,
            (Polarity::ActiveHigh, true) => Polarity::ActiveLow,
            (Polarity::ActiveLow, true) => Polarity::ActiveHigh,
        }
    }

    /// Physical level that represents the logical state
    pub const fn level_for(&self, active: bool) -> bool {
        match self {
            Polarity::ActiveHigh => active,
            Polarity::ActiveLow => !active,
        }
    }
}

/// Machine axes in settings bit order
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const COUNT: usize = 3;
    pub const ALL: [Axis; Axis::COUNT] = [Axis::X, Axis::Y, Axis::Z];

    /// Settings-space bit for this axis
    pub const fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// Bit-per-axis mask as stored by the settings store (`$2`, `$3`, `$23`)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(pub u8);

impl AxisMask {
    pub const NONE: AxisMask = AxisMask(0);

    pub const fn of(axes: &[Axis]) -> AxisMask {
        let mut bits = 0;
        let mut i = 0;
        while i < axes.len() {
            bits |= axes[i].bit();
            i += 1;
        }
        AxisMask(bits)
    }

    pub const fn contains(&self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }
}

/// Port-space invert mask: a set bit reverses logical/physical mapping
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvertMask(pub u8);

/// Port-space pull-up mask: a set bit enables the internal pull-up
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PullupMask(pub u8);

/// A named singleton pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinDescriptor {
    pub name: &'static str,
    pub port: PortId,
    pub bit: u8,
    pub dir: IoDir,
    pub polarity: Polarity,
}

impl PinDescriptor {
    pub const fn new(name: &'static str, port: PortId, bit: u8, dir: IoDir, polarity: Polarity) -> Self {
        assert!(bit < 8, "pin bit position out of range");
        Self { name, port, bit, dir, polarity }
    }

    pub const fn output(name: &'static str, port: PortId, bit: u8) -> Self {
        Self::new(name, port, bit, IoDir::Output, Polarity::ActiveHigh)
    }

    pub const fn input(name: &'static str, port: PortId, bit: u8) -> Self {
        Self::new(name, port, bit, IoDir::Input, Polarity::ActiveHigh)
    }

    /// Register mask of this pin
    pub const fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// A named group of pins sharing one port and one direction
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VirtualPortDescriptor {
    pub name: &'static str,
    pub port: PortId,
    pub dir: IoDir,
    /// Member bit positions, in axis order for STEP/DIRECTION/LIMIT
    pub members: &'static [u8],
    /// Union of the member bits
    pub mask: u8,
}

impl VirtualPortDescriptor {
    /// Build a descriptor, deriving the mask from the member bits.
    ///
    /// Evaluated in const context, a duplicate or out-of-range bit is a
    /// build error.
    pub const fn new(name: &'static str, port: PortId, dir: IoDir, members: &'static [u8]) -> Self {
        let mut mask = 0u8;
        let mut i = 0;
        while i < members.len() {
            let bit = members[i];
            assert!(bit < 8, "virtual port member bit out of range");
            assert!(mask & (1 << bit) == 0, "virtual port member bit used twice");
            mask |= 1 << bit;
            i += 1;
        }
        Self { name, port, dir, members, mask }
    }

    /// Register bit of the member at `index`, or 0 if there is none
    pub const fn member_mask(&self, index: usize) -> u8 {
        if index < self.members.len() {
            1 << self.members[index]
        } else {
            0
        }
    }

    /// Spread a settings-space axis mask onto this port's bits
    pub const fn spread(&self, axes: AxisMask) -> u8 {
        let mut bits = 0;
        let mut i = 0;
        while i < self.members.len() && i < 8 {
            if axes.0 & (1 << i) != 0 {
                bits |= 1 << self.members[i];
            }
            i += 1;
        }
        bits
    }

    /// Collapse port bits back into settings-space bit order
    pub const fn collapse(&self, bits: u8) -> AxisMask {
        let mut axes = 0;
        let mut i = 0;
        while i < self.members.len() && i < 8 {
            if bits & (1 << self.members[i]) != 0 {
                axes |= 1 << i;
            }
            i += 1;
        }
        AxisMask(axes)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for VirtualPortDescriptor {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}({}, mask={=u8:#04x})", self.name, self.port, self.mask)
    }
}

/// Anything the GPIO Engine can address: a group or a singleton
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Descriptor {
    Port(VirtualPortDescriptor),
    Pin(PinDescriptor),
}

impl Descriptor {
    pub const fn port(&self) -> PortId {
        match self {
            Descriptor::Port(p) => p.port,
            Descriptor::Pin(p) => p.port,
        }
    }

    pub const fn mask(&self) -> u8 {
        match self {
            Descriptor::Port(p) => p.mask,
            Descriptor::Pin(p) => p.mask(),
        }
    }

    pub const fn dir(&self) -> IoDir {
        match self {
            Descriptor::Port(p) => p.dir,
            Descriptor::Pin(p) => p.dir,
        }
    }
}

impl From<VirtualPortDescriptor> for Descriptor {
    fn from(port: VirtualPortDescriptor) -> Self {
        Descriptor::Port(port)
    }
}

impl From<PinDescriptor> for Descriptor {
    fn from(pin: PinDescriptor) -> Self {
        Descriptor::Pin(pin)
    }
}
