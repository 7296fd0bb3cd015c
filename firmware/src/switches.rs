//! The seven switch inputs on PORTB.
//!
//! PB0..PB6 are inputs with the internal pull-ups on, so an open switch
//! reads high and a pressed one reads low. PB1 and PB5 are the dial lines.

use avr_device::atmega32u4::PORTB;

use mediapad_core::SWITCH_MASK;

/// Configure PB0-PB6 as inputs with pull-ups.
pub fn init_gpio(portb: &PORTB) {
    portb.ddrb.modify(|r, w| unsafe {
        w.bits(r.bits() & !SWITCH_MASK)
    });
    portb.portb.modify(|r, w| unsafe {
        w.bits(r.bits() | SWITCH_MASK)
    });
}

/// Instantaneous switch levels, bit i = PBi (active low).
#[inline(always)]
pub fn read(portb: &PORTB) -> u8 {
    portb.pinb.read().bits() & SWITCH_MASK
}
