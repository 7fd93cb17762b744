//! Hardware Abstraction Layer: the back-end traits a microcontroller port implements

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::Duration;

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::Duration;

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Mock duration type
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }
}

use crate::clock::{Prescaler, WatchdogTimeout};
use crate::types::PortId;

/// Error types for port layer operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// Periodic timer programmed with a zero period
    ZeroPeriod,
    /// Step pulse would not end before the next pulse starts
    PulseWidthExceedsPeriod,
    /// Spindle PWM limits are not ordered or exceed the counter
    InvalidPwmRange,
    /// Operation does not match the pin direction
    WrongDirection,
    /// Component used before it was configured
    NotInitialized,
    /// Invalid configuration
    InvalidConfig,
    /// Transmit buffer has no room
    BufferFull,
}

#[cfg(feature = "std")]
impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PortError::ZeroPeriod => write!(f, "Periodic timer period must be non-zero"),
            PortError::PulseWidthExceedsPeriod => write!(f, "Step pulse width must be shorter than the step period"),
            PortError::InvalidPwmRange => write!(f, "Spindle PWM range is invalid"),
            PortError::WrongDirection => write!(f, "Operation does not match pin direction"),
            PortError::NotInitialized => write!(f, "Component not initialized"),
            PortError::InvalidConfig => write!(f, "Invalid configuration"),
            PortError::BufferFull => write!(f, "Serial buffer full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PortError {}

impl embedded_hal::digital::Error for PortError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// I/O port registers addressed by the GPIO Engine
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortRegister {
    /// Data direction, a set bit is an output (DDRx)
    Direction,
    /// Output latch; on input bits it enables the pull-up (PORTx)
    Output,
    /// Pin levels as sampled (PINx)
    Input,
    /// Pin-change interrupt mask of the port's group (PCMSKn)
    ChangeMask,
}

/// Raw access to the I/O port register file.
///
/// Implementations perform single volatile accesses; the GPIO Engine
/// provides the interrupt-safe read-modify-write sequences on top.
pub trait PortRegisters {
    /// Read a register of `port`
    fn read(&self, port: PortId, reg: PortRegister) -> u8;

    /// Write a register of `port`
    fn write(&self, port: PortId, reg: PortRegister, value: u8);

    /// Enable or disable the pin-change interrupt group of `port` (PCICR)
    fn enable_change_group(&self, port: PortId, enable: bool);

    /// Whether the pin-change group of `port` is enabled
    fn change_group_enabled(&self, port: PortId) -> bool;
}

/// Free-running counter in clear-on-compare mode driving step edges
pub trait PulseCounter {
    /// Clear-on-compare mode with compare outputs disconnected
    fn init(&self);

    /// Select the counter clock
    fn set_clock(&self, prescaler: Prescaler);

    /// Compare value; the counter period is `compare + 1` clocks
    fn set_compare(&self, compare: u16);

    /// Restart counting from zero
    fn reset_count(&self);

    /// Enable or disable the compare-match interrupt
    fn enable_interrupt(&self, enable: bool);

    /// Clear a latched compare-match flag
    fn clear_pending(&self);

    /// Whether a compare-match flag is latched
    fn interrupt_pending(&self) -> bool;
}

/// Up-counter whose overflow ends a step pulse
pub trait ResetCounter {
    /// Counter modulus, 256 for an 8-bit counter
    const MODULUS: u16;

    /// Fixed counter clock while running
    const PRESCALER: Prescaler;

    /// Normal mode, overflow interrupt enabled, clock stopped
    fn init(&self);

    /// Load the counter value
    fn load(&self, count: u16);

    /// Start the counter clock
    fn start(&self);

    /// Stop the counter clock
    fn stop(&self);

    /// Clear a latched overflow flag
    fn clear_pending(&self);

    /// Whether an overflow flag is latched
    fn interrupt_pending(&self) -> bool;
}

/// Counter in fast-PWM mode driving the spindle speed output
pub trait PwmCounter {
    /// Largest compare value the counter accepts
    const MAX_DUTY: u16;

    /// Fast PWM mode and clock selection, output disconnected
    fn init(&self);

    /// Output compare value
    fn set_compare(&self, duty: u16);

    /// Connect or disconnect the compare output from the pin
    fn connect_output(&self, connect: bool);

    /// Whether the compare output drives the pin
    fn output_connected(&self) -> bool;
}

/// Coarse low-power timeout used for switch debouncing
pub trait DebounceCounter {
    /// Interrupt mode (no reset) with the given timeout, stopped
    fn init(&self, timeout: WatchdogTimeout);

    /// Change the timeout
    fn set_timeout(&self, timeout: WatchdogTimeout);

    /// Enable the timeout interrupt
    fn start(&self);

    /// Disable the timeout interrupt
    fn stop(&self);

    /// Whether the timeout interrupt is enabled
    fn is_running(&self) -> bool;

    /// Clear a latched timeout flag
    fn clear_pending(&self);

    /// Whether a timeout flag is latched
    fn interrupt_pending(&self) -> bool;
}

/// UART data register with a data-register-empty interrupt
pub trait SerialRegisters {
    /// 8N1 at `baud`, receiver, transmitter and receive interrupt on
    fn init(&self, baud: u32);

    /// Enable or disable the data-register-empty interrupt
    fn enable_tx_interrupt(&self, enable: bool);

    fn tx_interrupt_enabled(&self) -> bool;

    /// Hand one byte to the transmitter
    fn write_data(&self, byte: u8);

    /// Take the received byte
    fn read_data(&self) -> u8;
}

/// Complete port back-end
pub trait PortHal {
    type Ports: PortRegisters;
    type Pulse: PulseCounter;
    type Reset: ResetCounter;
    type Spindle: PwmCounter;
    type Debounce: DebounceCounter;
    type Serial: SerialRegisters;

    /// Hand out the individual peripherals, each to exactly one owner
    #[allow(clippy::type_complexity)]
    fn split(self) -> HalParts<Self::Ports, Self::Pulse, Self::Reset, Self::Spindle, Self::Debounce, Self::Serial>;
}

/// Peripherals of a [`PortHal`], one per component
pub struct HalParts<P, T, R, S, D, U> {
    pub ports: P,
    pub pulse: T,
    pub reset: R,
    pub spindle: S,
    pub debounce: D,
    pub serial: U,
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
