//! ATmega328P register addresses and volatile access
//!
//! Addresses are data-space addresses (I/O address + 0x20).

// I/O ports
pub const PINB: usize = 0x23;
pub const DDRB: usize = 0x24;
pub const PORTB: usize = 0x25;
pub const PINC: usize = 0x26;
pub const DDRC: usize = 0x27;
pub const PORTC: usize = 0x28;
pub const PIND: usize = 0x29;
pub const DDRD: usize = 0x2A;
pub const PORTD: usize = 0x2B;

// Pin-change interrupts
pub const PCICR: usize = 0x68;
pub const PCMSK0: usize = 0x6B;
pub const PCMSK1: usize = 0x6C;
pub const PCMSK2: usize = 0x6D;

// Timer/Counter0, step reset
pub const TIFR0: usize = 0x35;
pub const TCCR0A: usize = 0x44;
pub const TCCR0B: usize = 0x45;
pub const TCNT0: usize = 0x46;
pub const TIMSK0: usize = 0x6E;
pub const TOV0: u8 = 0;
pub const TOIE0: u8 = 0;
pub const CS01: u8 = 1;

// Timer/Counter1, step pulse
pub const TIFR1: usize = 0x36;
pub const TIMSK1: usize = 0x6F;
pub const TCCR1A: usize = 0x80;
pub const TCCR1B: usize = 0x81;
pub const TCNT1L: usize = 0x84;
pub const TCNT1H: usize = 0x85;
pub const OCR1AL: usize = 0x88;
pub const OCR1AH: usize = 0x89;
pub const OCF1A: u8 = 1;
pub const OCIE1A: u8 = 1;
pub const WGM12: u8 = 3;
pub const WGM13: u8 = 4;
pub const CS1_MASK: u8 = 0b0000_0111;

// Timer/Counter2, spindle PWM
pub const TCCR2A: usize = 0xB0;
pub const TCCR2B: usize = 0xB1;
pub const OCR2A: usize = 0xB3;
pub const WGM20: u8 = 0;
pub const WGM21: u8 = 1;
pub const COM2A1: u8 = 7;
pub const CS21: u8 = 1;

// Watchdog
pub const MCUSR: usize = 0x54;
pub const WDTCSR: usize = 0x60;
pub const WDRF: u8 = 3;
pub const WDIF: u8 = 7;
pub const WDIE: u8 = 6;
pub const WDP3: u8 = 5;
pub const WDCE: u8 = 4;
pub const WDE: u8 = 3;

// USART0
pub const UCSR0A: usize = 0xC0;
pub const UCSR0B: usize = 0xC1;
pub const UCSR0C: usize = 0xC2;
pub const UBRR0L: usize = 0xC4;
pub const UBRR0H: usize = 0xC5;
pub const UDR0: usize = 0xC6;
pub const U2X0: u8 = 1;
pub const RXCIE0: u8 = 7;
pub const UDRIE0: u8 = 5;
pub const RXEN0: u8 = 4;
pub const TXEN0: u8 = 3;
pub const UCSZ00: u8 = 1;
pub const UCSZ01: u8 = 2;

// Status register
pub const SREG: usize = 0x5F;
pub const SREG_I: u8 = 7;

/// Bit value of bit number `bit`
#[inline(always)]
pub const fn bv(bit: u8) -> u8 {
    1 << bit
}

#[inline(always)]
pub fn read(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

#[inline(always)]
pub fn write(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

#[inline(always)]
pub fn set_bits(addr: usize, bits: u8) {
    write(addr, read(addr) | bits);
}

#[inline(always)]
pub fn clear_bits(addr: usize, bits: u8) {
    write(addr, read(addr) & !bits);
}

/// Write a 16-bit register pair through the shared TEMP latch: high byte
/// first, with interrupts masked
#[inline(always)]
pub fn write_u16(high: usize, low: usize, value: u16) {
    critical_section::with(|_| {
        write(high, (value >> 8) as u8);
        write(low, value as u8);
    });
}
