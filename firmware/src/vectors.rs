//! Interrupt vector bodies
//!
//! The port layer lives in one `static`; each function here is the whole
//! body of the matching ATmega328P vector, e.g.
//!
//! ```ignore
//! #[avr_device::interrupt(atmega328p)]
//! fn TIMER1_COMPA() {
//!     grbl_port_avr::vectors::timer1_compa();
//! }
//! ```

use core::cell::Cell;
use critical_section::Mutex;

use grbl_port_core::gpio::Gpio;
use grbl_port_core::peripherals::Peripherals;
use grbl_port_core::serial::Serial;
use grbl_port_core::timer::{Callback, DebounceTimer, PulseTimer, ResetTimer, SpindlePwm};
use grbl_port_core::types::PortId;

use crate::atmega328p_hardware::{Atmega328p, Ports, Timer0, Timer1, Timer2, Usart0, Watchdog};

/// The port layer of this MCU
pub static PORT: Peripherals<Atmega328p> = Peripherals {
    gpio: Gpio::new(Ports),
    pulse: PulseTimer::new(Timer1),
    reset: ResetTimer::new(Timer0),
    spindle: SpindlePwm::new(Timer2),
    debounce: DebounceTimer::new(Watchdog),
    serial: Serial::new(Usart0),
};

/// Pin-change handlers, indexed by port
static PIN_CHANGE: Mutex<Cell<[Option<Callback>; PortId::COUNT]>> = Mutex::new(Cell::new([None; PortId::COUNT]));

/// Run `handler` whenever a pin of `port`'s change group toggles
pub fn register_pin_change(port: PortId, handler: Callback) {
    critical_section::with(|cs| {
        let cell = PIN_CHANGE.borrow(cs);
        let mut handlers = cell.get();
        handlers[port.index()] = Some(handler);
        cell.set(handlers);
    });
}

/// TIMER1_COMPA: step pulse
pub fn timer1_compa() {
    PORT.pulse.on_interrupt();
}

/// TIMER0_OVF: step reset
pub fn timer0_ovf() {
    PORT.reset.on_interrupt();
}

/// WDT: debounce window elapsed
pub fn wdt() {
    PORT.debounce.on_interrupt();
}

/// USART_RX
pub fn usart_rx() {
    PORT.serial.on_rx_interrupt();
}

/// USART_UDRE
pub fn usart_udre() {
    PORT.serial.on_tx_interrupt();
}

/// PCINT0 (port B)
pub fn pcint0() {
    pin_change(PortId::B);
}

/// PCINT1 (port C)
pub fn pcint1() {
    pin_change(PortId::C);
}

/// PCINT2 (port D)
pub fn pcint2() {
    pin_change(PortId::D);
}

fn pin_change(port: PortId) {
    let handler = critical_section::with(|cs| PIN_CHANGE.borrow(cs).get()[port.index()]);
    if let Some(handler) = handler {
        handler();
    }
}
