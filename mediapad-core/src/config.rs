//! Compiled-in switch actions, dial mapping and timing.
//!
//! Long presses behave the following way, per switch:
//!
//! - `short` empty, `long` empty: no action (used for the dial lines).
//! - `short` set, `long` empty: the keys are pressed while the switch is held
//!   and released with it. Holding triggers key-repeat on the host.
//! - `short` set, `long` set: nothing happens on press. Once the long-press
//!   time has passed the long keys are pressed and held until release. If the
//!   switch is released before that, the short keys are sent as a single tap.
//! - `short` empty, `long` set: as above, but an early release sends nothing.

use thiserror::Error;

use crate::keycode::LogicalKey::Media;
use crate::keycode::{LogicalKey, MediaKey};
use crate::SWITCH_COUNT;

/// CPU clock of the Teensy 2.0.
pub const CPU_HZ: u32 = 16_000_000;

/// Timer0 is 8 bits wide and ticks on overflow.
const TIMER_COUNTS_PER_TICK: u32 = 256;

/// Keys sent by one switch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwitchAction {
    pub short: &'static [LogicalKey],
    pub long: &'static [LogicalKey],
}

impl SwitchAction {
    pub const INERT: SwitchAction = SwitchAction {
        short: &[],
        long: &[],
    };

    /// Keys held for as long as the switch is held.
    pub const fn hold(keys: &'static [LogicalKey]) -> Self {
        Self {
            short: keys,
            long: &[],
        }
    }

    /// Tap `short` on a quick release, hold `long` once the press is long.
    pub const fn tap_or_long(short: &'static [LogicalKey], long: &'static [LogicalKey]) -> Self {
        Self { short, long }
    }

    pub const fn is_inert(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }

    pub const fn has_long(&self) -> bool {
        !self.long.is_empty()
    }
}

/// The two switch lines that form the detent dial and what one click sends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DialConfig {
    pub line_a: usize,
    pub line_b: usize,
    pub cw: &'static [LogicalKey],
    pub ccw: &'static [LogicalKey],
}

/// Timer0 clock select (TCCR0B CS0[2:0]).
///
/// Faster ticks feel more responsive but need larger tick thresholds for the
/// same debounce and long-press times.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerPrescaler {
    /// clkIO/64, ~976.6 Hz
    Div64,
    /// clkIO/256, ~244.14 Hz
    Div256,
    /// clkIO/1024, ~61 Hz
    Div1024,
}

impl TimerPrescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            TimerPrescaler::Div64 => 64,
            TimerPrescaler::Div256 => 256,
            TimerPrescaler::Div1024 => 1024,
        }
    }

    /// Value for the CS0[2:0] bits.
    pub const fn clock_select(self) -> u8 {
        match self {
            TimerPrescaler::Div64 => 0x03,
            TimerPrescaler::Div256 => 0x04,
            TimerPrescaler::Div1024 => 0x05,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub actions: [SwitchAction; SWITCH_COUNT],
    pub dial: DialConfig,
    /// Consecutive identical samples before a press or release registers.
    pub debounce_ticks: u16,
    /// Consecutive identical samples (counted from the same change) before a
    /// press becomes a long press. Must be greater than `debounce_ticks`.
    pub long_press_ticks: u16,
    pub timer_prescaler: TimerPrescaler,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("debounce threshold must be at least one tick")]
    ZeroDebounce,
    #[error("long-press threshold ({long_press}) must exceed debounce threshold ({debounce})")]
    LongPressTooShort { debounce: u16, long_press: u16 },
    #[error("dial line {0} is not a switch input")]
    DialLineOutOfRange(usize),
    #[error("dial lines A and B use the same switch {0}")]
    DialLinesShared(usize),
    #[error("switch {0} is a dial line but has keys assigned")]
    DialLineMapped(usize),
}

impl Config {
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ticks == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.long_press_ticks <= self.debounce_ticks {
            return Err(ConfigError::LongPressTooShort {
                debounce: self.debounce_ticks,
                long_press: self.long_press_ticks,
            });
        }

        let (a, b) = (self.dial.line_a, self.dial.line_b);
        if a >= SWITCH_COUNT {
            return Err(ConfigError::DialLineOutOfRange(a));
        }
        if b >= SWITCH_COUNT {
            return Err(ConfigError::DialLineOutOfRange(b));
        }
        if a == b {
            return Err(ConfigError::DialLinesShared(a));
        }
        if !self.actions[a].is_inert() {
            return Err(ConfigError::DialLineMapped(a));
        }
        if !self.actions[b].is_inert() {
            return Err(ConfigError::DialLineMapped(b));
        }
        Ok(())
    }

    /// Length of one tick in microseconds.
    pub const fn tick_period_us(&self) -> u32 {
        self.timer_prescaler.divisor() * TIMER_COUNTS_PER_TICK / (CPU_HZ / 1_000_000)
    }

    pub const fn ticks_to_ms(&self, ticks: u16) -> u32 {
        ticks as u32 * self.tick_period_us() / 1000
    }
}

/// The stock pad: five buttons around a volume dial.
pub const DEFAULT: Config = Config {
    actions: [
        // PB0 = S2 / down
        SwitchAction::tap_or_long(&[Media(MediaKey::WwwHome)], &[Media(MediaKey::WwwSearch)]),
        // PB1 = dial A
        SwitchAction::INERT,
        // PB2 = S1 / center
        SwitchAction::hold(&[Media(MediaKey::Sleep)]),
        // PB3 = S5 / left
        SwitchAction::hold(&[Media(MediaKey::PrevTrack)]),
        // PB4 = S4 / up
        SwitchAction::hold(&[Media(MediaKey::PlayPause)]),
        // PB5 = dial B
        SwitchAction::INERT,
        // PB6 = S3 / right
        SwitchAction::hold(&[Media(MediaKey::NextTrack)]),
    ],
    dial: DialConfig {
        line_a: 1,
        line_b: 5,
        cw: &[Media(MediaKey::VolumeUp)],
        ccw: &[Media(MediaKey::VolumeDown)],
    },
    debounce_ticks: 3,
    // About 2/3 of a second at 244 Hz.
    long_press_ticks: 160,
    timer_prescaler: TimerPrescaler::Div256,
};

/// Switch labels as printed on the stock PCB.
pub const SWITCH_LABELS: [&str; SWITCH_COUNT] = [
    "S2 down",
    "dial A",
    "S1 center",
    "S5 left",
    "S4 up",
    "dial B",
    "S3 right",
];
