//! Clock constants and tick conversions

/// CPU clock in Hz
pub const F_CPU: u32 = 16_000_000;

/// CPU cycles per microsecond
pub const TICKS_PER_MICROSECOND: u32 = F_CPU / 1_000_000;

/// CPU cycles per millisecond
pub const TICKS_PER_MILLISECOND: u32 = F_CPU / 1_000;

/// Interrupt entry and port write time eaten from each step pulse
pub const RESET_LATENCY_US: u16 = 2;

/// Counter clock divider
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    pub const fn divisor(&self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }
}

/// A Pulse Timer period split into counter clock and compare value
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulsePeriod {
    pub prescaler: Prescaler,
    pub compare: u16,
}

impl PulsePeriod {
    /// Longest representable period in CPU cycles
    pub const MAX_CYCLES: u32 = 65_536 * 64;

    /// Split a period in CPU cycles.
    ///
    /// Periods up to 2^16 cycles run unprescaled, up to 2^19 at 1/8 and
    /// the rest at 1/64. Out-of-range periods saturate; zero becomes one
    /// cycle (callers reject zero before getting here).
    pub const fn from_cycles(cycles: u32) -> Self {
        let cycles = if cycles == 0 { 1 } else { cycles };
        let (prescaler, ticks) = if cycles <= 1 << 16 {
            (Prescaler::Div1, cycles)
        } else if cycles <= 1 << 19 {
            (Prescaler::Div8, cycles >> 3)
        } else if cycles <= Self::MAX_CYCLES {
            (Prescaler::Div64, cycles >> 6)
        } else {
            (Prescaler::Div64, 1 << 16)
        };
        Self { prescaler, compare: (ticks - 1) as u16 }
    }

    /// Actual period in CPU cycles
    pub const fn cycles(&self) -> u32 {
        (self.compare as u32 + 1) * self.prescaler.divisor()
    }
}

/// Reset Timer ticks for a step pulse width in microseconds.
///
/// The Reset Timer counts at 1/8 of the CPU clock. Interrupt latency is
/// subtracted, and the result never drops below one tick.
pub const fn reset_ticks_for_us(us: u16) -> u16 {
    let effective = us.saturating_sub(RESET_LATENCY_US) as u32;
    let ticks = effective * TICKS_PER_MICROSECOND / 8;
    if ticks == 0 {
        1
    } else if ticks > u16::MAX as u32 {
        u16::MAX
    } else {
        ticks as u16
    }
}

/// Pulse Timer period in CPU cycles for a step rate in Hz
pub fn cycles_for_step_rate(rate_hz: f32) -> u32 {
    if rate_hz <= 0.0 {
        return PulsePeriod::MAX_CYCLES;
    }
    let cycles = F_CPU as f32 / rate_hz + 0.5;
    if cycles < 1.0 {
        1
    } else if cycles >= PulsePeriod::MAX_CYCLES as f32 {
        PulsePeriod::MAX_CYCLES
    } else {
        cycles as u32
    }
}

/// Step rate in Hz produced by a period in CPU cycles
pub fn step_rate_for_cycles(cycles: u32) -> f32 {
    F_CPU as f32 / cycles.max(1) as f32
}

/// Keep a step pulse width strictly shorter than the step period
pub const fn clamp_pulse_width(width_cycles: u32, period_cycles: u32) -> u32 {
    if period_cycles == 0 {
        0
    } else if width_cycles >= period_cycles {
        period_cycles - 1
    } else {
        width_cycles
    }
}

/// Watchdog timeouts available to the Debounce Timer
#[derive(Copy, Clone, PartialEq, Eq, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogTimeout {
    Ms16,
    Ms32,
    Ms64,
    Ms125,
    Ms250,
    Ms500,
    S1,
    S2,
    S4,
    S8,
}

impl WatchdogTimeout {
    pub const ALL: [WatchdogTimeout; 10] = [
        WatchdogTimeout::Ms16,
        WatchdogTimeout::Ms32,
        WatchdogTimeout::Ms64,
        WatchdogTimeout::Ms125,
        WatchdogTimeout::Ms250,
        WatchdogTimeout::Ms500,
        WatchdogTimeout::S1,
        WatchdogTimeout::S2,
        WatchdogTimeout::S4,
        WatchdogTimeout::S8,
    ];

    /// Nominal timeout in milliseconds
    pub const fn millis(&self) -> u32 {
        match self {
            WatchdogTimeout::Ms16 => 16,
            WatchdogTimeout::Ms32 => 32,
            WatchdogTimeout::Ms64 => 64,
            WatchdogTimeout::Ms125 => 125,
            WatchdogTimeout::Ms250 => 250,
            WatchdogTimeout::Ms500 => 500,
            WatchdogTimeout::S1 => 1_000,
            WatchdogTimeout::S2 => 2_000,
            WatchdogTimeout::S4 => 4_000,
            WatchdogTimeout::S8 => 8_000,
        }
    }

    /// Prescaler select value (WDP3..0)
    pub const fn select_bits(&self) -> u8 {
        *self as u8
    }

    /// Shortest timeout not shorter than `ms`, saturating at 8 s
    pub const fn covering(ms: u64) -> WatchdogTimeout {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i].millis() as u64 >= ms {
                return Self::ALL[i];
            }
            i += 1;
        }
        WatchdogTimeout::S8
    }
}
