#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

//! # grbl Port AVR
//!
//! ATmega328P back-end for the grbl port layer: register-level
//! implementations of the [`grbl_port_core::hal`] traits, the
//! single-core critical section, and the interrupt vector bodies.

pub mod registers;
pub mod atmega328p_hardware;
pub mod vectors;

pub use atmega328p_hardware::Atmega328p;
pub use grbl_port_core::*;
pub use vectors::PORT;

use grbl_port_core::board::ARDUINO_UNO;

/// Bring the port layer up on an Arduino Uno wired board with the
/// build-time machine's settings
pub fn init() -> Result<(), PortError> {
    PORT.init(&ARDUINO_UNO, &grbl_port_core::default_settings())?;

    #[cfg(feature = "defmt")]
    defmt::info!("✅ grbl port layer v{} up", grbl_port_core::VERSION);

    Ok(())
}
