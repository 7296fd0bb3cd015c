//! One-slot hand-off of raw samples from the timer interrupt to the main loop.
//!
//! The interrupt posts the sample it captured; the main loop takes it. Both
//! sides touch the slot only inside a critical section, so the "tick
//! pending" flag and the sample are always read together. Posting over an
//! untaken sample replaces it: that tick is lost, which only delays the
//! debounce counters by one period.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

pub struct TickMailbox {
    slot: Mutex<Cell<Option<u8>>>,
}

impl Default for TickMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl TickMailbox {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Store a sample. Called from the tick interrupt.
    pub fn post(&self, raw: u8) {
        critical_section::with(|cs| self.post_in(cs, raw));
    }

    pub fn post_in(&self, cs: CriticalSection<'_>, raw: u8) {
        self.slot.borrow(cs).set(Some(raw));
    }

    /// Take the pending sample, if any.
    pub fn take(&self) -> Option<u8> {
        critical_section::with(|cs| self.take_in(cs))
    }

    /// Take the pending sample while already holding a critical section.
    /// The firmware's idle loop uses this to check and sleep without a gap.
    pub fn take_in(&self, cs: CriticalSection<'_>) -> Option<u8> {
        self.slot.borrow(cs).take()
    }

    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).get().is_some())
    }
}
