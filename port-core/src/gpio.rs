//! GPIO Engine: interrupt-safe access to virtual ports and singleton pins

use crate::hal::{PortError, PortRegister, PortRegisters};
use crate::types::{Descriptor, InvertMask, PinDescriptor, PortId, PullupMask, VirtualPortDescriptor};

/// GPIO Engine over a port register file.
///
/// Every read-modify-write runs inside a critical section, so the same
/// engine can be used from main-line code and interrupt handlers.
pub struct Gpio<R> {
    regs: R,
}

impl<R: PortRegisters> Gpio<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Replace the `mask` bits of one register with `bits`
    fn modify(&self, port: PortId, reg: PortRegister, mask: u8, bits: u8) {
        critical_section::with(|_| {
            let value = self.regs.read(port, reg);
            self.regs.write(port, reg, (value & !mask) | (bits & mask));
        });
    }

    /// Set the hardware direction of a group or pin from its descriptor
    pub fn init(&self, target: impl Into<Descriptor>) {
        let target = target.into();
        let mask = target.mask();
        let bits = if target.dir().is_output() { mask } else { 0 };
        self.modify(target.port(), PortRegister::Direction, mask, bits);

        #[cfg(feature = "defmt")]
        defmt::debug!("🔌 GPIO init {} mask={=u8:#04x} output={}", target.port(), mask, target.dir().is_output());
    }

    /// Set exactly the member bits of `port` to `bits & mask`
    pub fn write(&self, port: &VirtualPortDescriptor, bits: u8) {
        self.modify(port.port, PortRegister::Output, port.mask, bits);
    }

    /// Set or clear one pin
    pub fn write_pin(&self, pin: &PinDescriptor, high: bool) {
        let mask = pin.mask();
        self.modify(pin.port, PortRegister::Output, mask, if high { mask } else { 0 });
    }

    /// Member bits of `port`, in register positions.
    ///
    /// Output groups read back the output latch, input groups the pins.
    pub fn read(&self, port: &VirtualPortDescriptor) -> u8 {
        self.regs.read(port.port, Self::level_register(port.dir.is_output())) & port.mask
    }

    /// Level of one pin, see [`read`](Self::read)
    pub fn read_pin(&self, pin: &PinDescriptor) -> bool {
        self.regs.read(pin.port, Self::level_register(pin.dir.is_output())) & pin.mask() != 0
    }

    const fn level_register(output: bool) -> PortRegister {
        if output {
            PortRegister::Output
        } else {
            PortRegister::Input
        }
    }

    /// Enable or disable the internal pull-ups; no-op on outputs
    pub fn set_pullup(&self, target: impl Into<Descriptor>, enable: bool) {
        let target = target.into();
        if target.dir().is_output() {
            return;
        }
        let mask = target.mask();
        self.modify(target.port(), PortRegister::Output, mask, if enable { mask } else { 0 });
    }

    /// Enable the pull-ups of the member bits set in `pullups`, disable the rest.
    ///
    /// Bits outside the group are left alone; no-op on output groups.
    pub fn set_pullup_mask(&self, port: &VirtualPortDescriptor, pullups: PullupMask) {
        if port.dir.is_output() {
            return;
        }
        self.modify(port.port, PortRegister::Output, port.mask, pullups.0);
    }

    /// Arm or disarm the pin-change notification for the group's bits.
    ///
    /// The port's change group is switched off only when no bit of it
    /// remains armed, so pins sharing the group with another user keep
    /// their notification.
    pub fn enable_change_interrupt(&self, port: &VirtualPortDescriptor, enable: bool) {
        critical_section::with(|_| {
            let mask = self.regs.read(port.port, PortRegister::ChangeMask);
            let mask = if enable { mask | port.mask } else { mask & !port.mask };
            self.regs.write(port.port, PortRegister::ChangeMask, mask);
            if enable {
                self.regs.enable_change_group(port.port, true);
            } else if mask == 0 {
                self.regs.enable_change_group(port.port, false);
            }
        });
    }

    /// Whether any bit of the group is armed for change notification
    pub fn change_interrupt_enabled(&self, port: &VirtualPortDescriptor) -> bool {
        self.regs.change_group_enabled(port.port) && self.regs.read(port.port, PortRegister::ChangeMask) & port.mask != 0
    }

    /// Write logical bits, flipping the bits set in `invert`
    pub fn write_logical(&self, port: &VirtualPortDescriptor, bits: u8, invert: InvertMask) {
        self.write(port, bits ^ invert.0);
    }

    /// Read logical bits, flipping the bits set in `invert`
    pub fn read_logical(&self, port: &VirtualPortDescriptor, invert: InvertMask) -> u8 {
        self.read(port) ^ (invert.0 & port.mask)
    }

    /// Drive a pin to its active (or inactive) level
    pub fn set_active(&self, pin: &PinDescriptor, active: bool, invert: bool) {
        self.write_pin(pin, pin.polarity.inverted_if(invert).level_for(active));
    }

    /// Whether a pin sits at its active level
    pub fn is_active(&self, pin: &PinDescriptor, invert: bool) -> bool {
        self.read_pin(pin) == pin.polarity.inverted_if(invert).level_for(true)
    }

    /// Borrow one pin as an `embedded-hal` pin
    pub fn pin(&self, pin: PinDescriptor) -> PinHandle<'_, R> {
        PinHandle { gpio: self, pin }
    }
}

/// A singleton pin usable through the `embedded-hal` digital traits.
///
/// Levels are electrical; polarity is not applied.
pub struct PinHandle<'a, R> {
    gpio: &'a Gpio<R>,
    pin: PinDescriptor,
}

impl<R: PortRegisters> PinHandle<'_, R> {
    pub fn descriptor(&self) -> &PinDescriptor {
        &self.pin
    }

    fn require_output(&self) -> Result<(), PortError> {
        if self.pin.dir.is_output() {
            Ok(())
        } else {
            Err(PortError::WrongDirection)
        }
    }
}

impl<R: PortRegisters> embedded_hal::digital::ErrorType for PinHandle<'_, R> {
    type Error = PortError;
}

impl<R: PortRegisters> embedded_hal::digital::OutputPin for PinHandle<'_, R> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.require_output()?;
        self.gpio.write_pin(&self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.require_output()?;
        self.gpio.write_pin(&self.pin, true);
        Ok(())
    }
}

impl<R: PortRegisters> embedded_hal::digital::StatefulOutputPin for PinHandle<'_, R> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.require_output()?;
        Ok(self.gpio.read_pin(&self.pin))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

impl<R: PortRegisters> embedded_hal::digital::InputPin for PinHandle<'_, R> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.gpio.read_pin(&self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.gpio.read_pin(&self.pin))
    }
}
