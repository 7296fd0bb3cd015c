//! Media pad firmware for ATmega32U4 (Teensy 2.0).
//!
//! - Timer0 overflow samples the seven switches and posts the sample
//! - The main loop sleeps until a sample is pending, then runs the keypad
//! - USB HID keyboard + consumer control reports

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod hid;
mod switches;

use avr_device::atmega32u4::{Peripherals, CPU};
use critical_section::CriticalSection;

use hid::UsbKeyboard;
use mediapad_core::config::{self, Config};
use mediapad_core::{Keypad, TickMailbox};

const CONFIG: Config = config::DEFAULT;

const _: () = assert!(CONFIG.validate().is_ok(), "invalid keypad configuration");

/// SMCR sleep enable bit. SM[2:0] = 0 selects idle mode.
const SMCR_SE: u8 = 0x01;

/// Written by the timer interrupt, drained by the main loop.
static TICKS: TickMailbox = TickMailbox::new();

/// Panic handler: loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Main entry point.
#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // 16 MHz: disable the clock prescaler
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) });

    // LED on PD6 stays lit until the host has configured us
    dp.PORTD.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });
    dp.PORTD
        .portd
        .modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });

    switches::init_gpio(&dp.PORTB);

    let mut usb = UsbKeyboard::new(dp.USB_DEVICE, dp.PLL);
    usb.init();

    // Without a host this waits forever
    while !usb.is_configured() {
        usb.poll();
    }

    // Give the host a second to load drivers, still answering requests
    for _ in 0..1000u16 {
        usb.poll();
        delay_ms(1);
    }

    dp.PORTD
        .portd
        .modify(|r, w| unsafe { w.bits(r.bits() & !0x40) });

    let mut keypad = match Keypad::new(CONFIG, usb) {
        Ok(keypad) => keypad,
        Err(_) => loop {},
    };

    // Timer0 free-running, one tick per overflow
    dp.TC0.tccr0a.write(|w| unsafe { w.bits(0) });
    dp.TC0
        .tccr0b
        .write(|w| unsafe { w.bits(CONFIG.timer_prescaler.clock_select() & 0x07) });
    dp.TC0.timsk0.write(|w| w.toie0().set_bit());

    // Idle mode, sleep not yet enabled
    dp.CPU.smcr.write(|w| unsafe { w.bits(0) });

    loop {
        let raw = wait_for_tick(&dp.CPU);
        keypad.tick(raw);
        keypad.sink_mut().poll();
    }
}

/// Sleep until the timer interrupt has posted a sample, then take it.
///
/// The mailbox is checked with interrupts off. Interrupts come back on with
/// `sei` directly before `sleep`; `sei` only takes effect after the next
/// instruction, so a tick can't land between the check and the sleep.
fn wait_for_tick(cpu: &CPU) -> u8 {
    avr_device::interrupt::disable();
    loop {
        // Safety: interrupts are disabled until the sei below
        let cs = unsafe { CriticalSection::new() };
        if let Some(raw) = TICKS.take_in(cs) {
            unsafe { avr_device::interrupt::enable() };
            return raw;
        }

        cpu.smcr.modify(|r, w| unsafe { w.bits(r.bits() | SMCR_SE) });
        unsafe { core::arch::asm!("sei", "sleep") };
        cpu.smcr.modify(|r, w| unsafe { w.bits(r.bits() & !SMCR_SE) });
        avr_device::interrupt::disable();
    }
}

#[avr_device::interrupt(atmega32u4)]
fn TIMER0_OVF() {
    let dp = unsafe { Peripherals::steal() };
    TICKS.post(switches::read(&dp.PORTB));
}

/// Busy-wait delay in milliseconds (approximate, at 16MHz).
fn delay_ms(ms: u16) {
    for _ in 0..ms {
        // ~1ms at 16MHz: 16000 cycles / 4 cycles per loop iteration
        for _ in 0..4000u16 {
            unsafe { core::arch::asm!("nop") };
        }
    }
}
