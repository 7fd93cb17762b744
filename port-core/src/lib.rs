#![cfg_attr(not(any(feature = "std", test)), no_std)]

//! # grbl Port Core
//!
//! Timer and virtual-port abstraction layer for grbl motion control.
//! Maps the step pulse, step reset, spindle PWM and debounce timers and
//! the STEP/DIRECTION/LIMIT/CONTROL pin groups onto a microcontroller
//! back-end described by the [`hal`] traits.

pub mod types;
pub mod clock;
pub mod ports;
pub mod board;
pub mod machine;
pub mod settings;
pub mod hal;
pub mod gpio;
pub mod timer;
pub mod serial;
pub mod peripherals;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use clock::{Prescaler, PulsePeriod, WatchdogTimeout};
pub use ports::{Pin, PortMap, Signal, VirtualPort};
pub use machine::MachineProfile;
pub use settings::PortSettings;
pub use hal::{Duration, PortError, PortHal};
pub use gpio::{Gpio, PinHandle};
pub use timer::{Callback, DebounceTimer, PulseTimer, PwmRange, ResetTimer, SpindlePwm, TimerMode, TimerProgram, TimerState};
pub use serial::Serial;
pub use peripherals::Peripherals;

/// Port layer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings of the machine selected at build time
pub fn default_settings() -> PortSettings {
    PortSettings::from_profile(&machine::SELECTED)
}
