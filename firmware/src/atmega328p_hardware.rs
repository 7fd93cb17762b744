//! ATmega328P Hardware Implementation
//!
//! Timer/Counter1 paces step pulses, Timer/Counter0 ends them, Timer/Counter2
//! drives the spindle PWM pin (OC2A) and the watchdog, in interrupt mode,
//! times the limit switch debounce window.

use grbl_port_core::clock::{Prescaler, WatchdogTimeout, F_CPU};
use grbl_port_core::hal::{
    DebounceCounter, HalParts, PortHal, PortRegister, PortRegisters, PulseCounter, PwmCounter, ResetCounter,
    SerialRegisters,
};
use grbl_port_core::types::PortId;

use crate::registers::*;

/// Data-space address of a port register, `None` for ports the part lacks
pub const fn port_register(port: PortId, reg: PortRegister) -> Option<usize> {
    let (pin, ddr, out, pcmsk) = match port {
        PortId::B => (PINB, DDRB, PORTB, PCMSK0),
        PortId::C => (PINC, DDRC, PORTC, PCMSK1),
        PortId::D => (PIND, DDRD, PORTD, PCMSK2),
        _ => return None,
    };
    Some(match reg {
        PortRegister::Direction => ddr,
        PortRegister::Output => out,
        PortRegister::Input => pin,
        PortRegister::ChangeMask => pcmsk,
    })
}

/// PCICR enable bit of the pin-change group serving `port`
pub const fn change_group_bit(port: PortId) -> Option<u8> {
    match port {
        PortId::B => Some(0),
        PortId::C => Some(1),
        PortId::D => Some(2),
        _ => None,
    }
}

/// Timer/Counter1 clock select bits (CS12..CS10)
pub const fn timer1_clock_bits(prescaler: Prescaler) -> u8 {
    match prescaler {
        Prescaler::Div1 => 0b001,
        Prescaler::Div8 => 0b010,
        Prescaler::Div64 => 0b011,
        Prescaler::Div256 => 0b100,
        Prescaler::Div1024 => 0b101,
    }
}

/// WDTCSR prescaler bits; WDP3 is not adjacent to WDP2..0
pub const fn watchdog_prescaler_bits(timeout: WatchdogTimeout) -> u8 {
    let select = timeout.select_bits();
    let mut bits = select & 0b0111;
    if select & 0b1000 != 0 {
        bits |= bv(WDP3);
    }
    bits
}

/// UBRR0 value and whether the double-speed mode is used for `baud`
pub const fn baud_setting(baud: u32) -> (u16, bool) {
    if baud < 57_600 {
        (((F_CPU / (8 * baud) - 1) / 2) as u16, false)
    } else {
        (((F_CPU / (4 * baud) - 1) / 2) as u16, true)
    }
}

/// PORTB, PORTC and PORTD with their pin-change groups
#[derive(Debug, Default)]
pub struct Ports;

impl PortRegisters for Ports {
    fn read(&self, port: PortId, reg: PortRegister) -> u8 {
        port_register(port, reg).map_or(0, read)
    }

    fn write(&self, port: PortId, reg: PortRegister, value: u8) {
        if let Some(addr) = port_register(port, reg) {
            write(addr, value);
        }
    }

    fn enable_change_group(&self, port: PortId, enable: bool) {
        if let Some(bit) = change_group_bit(port) {
            if enable {
                set_bits(PCICR, bv(bit));
            } else {
                clear_bits(PCICR, bv(bit));
            }
        }
    }

    fn change_group_enabled(&self, port: PortId) -> bool {
        change_group_bit(port).is_some_and(|bit| read(PCICR) & bv(bit) != 0)
    }
}

/// Timer/Counter1 in CTC mode on OCR1A
#[derive(Debug, Default)]
pub struct Timer1;

impl PulseCounter for Timer1 {
    fn init(&self) {
        // Waveform generation 0100: CTC, OC1A/OC1B disconnected
        clear_bits(TCCR1B, bv(WGM13));
        set_bits(TCCR1B, bv(WGM12));
        write(TCCR1A, 0);
    }

    fn set_clock(&self, prescaler: Prescaler) {
        write(TCCR1B, (read(TCCR1B) & !CS1_MASK) | timer1_clock_bits(prescaler));
    }

    fn set_compare(&self, compare: u16) {
        write_u16(OCR1AH, OCR1AL, compare);
    }

    fn reset_count(&self) {
        write_u16(TCNT1H, TCNT1L, 0);
    }

    fn enable_interrupt(&self, enable: bool) {
        if enable {
            set_bits(TIMSK1, bv(OCIE1A));
        } else {
            clear_bits(TIMSK1, bv(OCIE1A));
        }
    }

    fn clear_pending(&self) {
        // Flags clear by writing one
        write(TIFR1, bv(OCF1A));
    }

    fn interrupt_pending(&self) -> bool {
        read(TIFR1) & bv(OCF1A) != 0
    }
}

/// Timer/Counter0 in normal mode, overflow ends the pulse
#[derive(Debug, Default)]
pub struct Timer0;

impl ResetCounter for Timer0 {
    const MODULUS: u16 = 256;
    const PRESCALER: Prescaler = Prescaler::Div8;

    fn init(&self) {
        write(TIMSK0, 0);
        write(TCCR0A, 0);
        write(TCCR0B, 0);
        write(TIMSK0, bv(TOIE0));
    }

    fn load(&self, count: u16) {
        write(TCNT0, count as u8);
    }

    fn start(&self) {
        write(TCCR0B, bv(CS01));
    }

    fn stop(&self) {
        write(TCCR0B, 0);
    }

    fn clear_pending(&self) {
        write(TIFR0, bv(TOV0));
    }

    fn interrupt_pending(&self) -> bool {
        read(TIFR0) & bv(TOV0) != 0
    }
}

/// Timer/Counter2 in fast PWM on OC2A (PB3), 1/8 clock for 7.8 kHz
#[derive(Debug, Default)]
pub struct Timer2;

impl PwmCounter for Timer2 {
    const MAX_DUTY: u16 = 255;

    fn init(&self) {
        write(TCCR2A, bv(WGM21) | bv(WGM20));
        write(TCCR2B, bv(CS21));
        write(OCR2A, 0);
    }

    fn set_compare(&self, duty: u16) {
        write(OCR2A, duty.min(Self::MAX_DUTY) as u8);
    }

    fn connect_output(&self, connect: bool) {
        if connect {
            set_bits(TCCR2A, bv(COM2A1));
        } else {
            clear_bits(TCCR2A, bv(COM2A1));
        }
    }

    fn output_connected(&self) -> bool {
        read(TCCR2A) & bv(COM2A1) != 0
    }
}

/// WDTCSR value that enables the timeout interrupt, or `None` when it
/// already is and the running window must be left alone
pub const fn watchdog_start_value(wdtcsr: u8) -> Option<u8> {
    if wdtcsr & bv(WDIE) == 0 {
        Some(wdtcsr | bv(WDIE))
    } else {
        None
    }
}

/// Watchdog in interrupt-only mode
#[derive(Debug, Default)]
pub struct Watchdog;

impl Watchdog {
    /// Restart the watchdog count so a new window runs a full timeout
    #[inline(always)]
    fn restart_count() {
        #[cfg(target_arch = "avr")]
        // SAFETY: `wdr` only clears the watchdog counter
        unsafe {
            core::arch::asm!("wdr", options(nomem, nostack, preserves_flags))
        };
    }

    /// Timed change sequence: WDCE|WDE, then the new value within four cycles
    fn timed_write(value: u8) {
        critical_section::with(|_| {
            set_bits(WDTCSR, bv(WDCE) | bv(WDE));
            write(WDTCSR, value);
        });
    }
}

impl DebounceCounter for Watchdog {
    fn init(&self, timeout: WatchdogTimeout) {
        clear_bits(MCUSR, bv(WDRF));
        Self::timed_write(watchdog_prescaler_bits(timeout));
    }

    fn set_timeout(&self, timeout: WatchdogTimeout) {
        let keep = read(WDTCSR) & bv(WDIE);
        Self::timed_write(keep | watchdog_prescaler_bits(timeout));
    }

    fn start(&self) {
        critical_section::with(|_| {
            if let Some(value) = watchdog_start_value(read(WDTCSR)) {
                Self::restart_count();
                write(WDTCSR, value);
            }
        });
    }

    fn stop(&self) {
        clear_bits(WDTCSR, bv(WDIE));
    }

    fn is_running(&self) -> bool {
        read(WDTCSR) & bv(WDIE) != 0
    }

    fn clear_pending(&self) {
        set_bits(WDTCSR, bv(WDIF));
    }

    fn interrupt_pending(&self) -> bool {
        read(WDTCSR) & bv(WDIF) != 0
    }
}

/// USART0, 8N1
#[derive(Debug, Default)]
pub struct Usart0;

impl SerialRegisters for Usart0 {
    fn init(&self, baud: u32) {
        let (ubrr, double_speed) = baud_setting(baud);
        if double_speed {
            set_bits(UCSR0A, bv(U2X0));
        } else {
            clear_bits(UCSR0A, bv(U2X0));
        }
        write(UBRR0H, (ubrr >> 8) as u8);
        write(UBRR0L, ubrr as u8);
        write(UCSR0C, bv(UCSZ01) | bv(UCSZ00));
        write(UCSR0B, bv(RXEN0) | bv(TXEN0) | bv(RXCIE0));
    }

    fn enable_tx_interrupt(&self, enable: bool) {
        if enable {
            set_bits(UCSR0B, bv(UDRIE0));
        } else {
            clear_bits(UCSR0B, bv(UDRIE0));
        }
    }

    fn tx_interrupt_enabled(&self) -> bool {
        read(UCSR0B) & bv(UDRIE0) != 0
    }

    fn write_data(&self, byte: u8) {
        write(UDR0, byte);
    }

    fn read_data(&self) -> u8 {
        read(UDR0)
    }
}

/// ATmega328P port back-end
#[derive(Debug, Default)]
pub struct Atmega328p;

impl PortHal for Atmega328p {
    type Ports = Ports;
    type Pulse = Timer1;
    type Reset = Timer0;
    type Spindle = Timer2;
    type Debounce = Watchdog;
    type Serial = Usart0;

    fn split(self) -> HalParts<Ports, Timer1, Timer0, Timer2, Watchdog, Usart0> {
        #[cfg(feature = "defmt")]
        defmt::info!("🔌 ATmega328P back-end");
        HalParts {
            ports: Ports,
            pulse: Timer1,
            reset: Timer0,
            spindle: Timer2,
            debounce: Watchdog,
            serial: Usart0,
        }
    }
}

#[cfg(target_arch = "avr")]
mod avr_critical_section {
    //! Single-core critical section over the global interrupt flag

    use core::sync::atomic::{compiler_fence, Ordering};

    use crate::registers::{bv, read, write, SREG, SREG_I};

    struct AvrCriticalSection;
    critical_section::set_impl!(AvrCriticalSection);

    unsafe impl critical_section::Impl for AvrCriticalSection {
        unsafe fn acquire() -> critical_section::RawRestoreState {
            let sreg = read(SREG);
            write(SREG, sreg & !bv(SREG_I));
            compiler_fence(Ordering::SeqCst);
            sreg & bv(SREG_I) != 0
        }

        unsafe fn release(was_enabled: critical_section::RawRestoreState) {
            compiler_fence(Ordering::SeqCst);
            if was_enabled {
                write(SREG, read(SREG) | bv(SREG_I));
            }
        }
    }
}
