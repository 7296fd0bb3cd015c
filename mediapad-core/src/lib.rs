//! Input-processing core for the seven-switch media pad.
//!
//! Turns raw switch samples (one per timer tick) into debounced presses,
//! long presses and dial clicks, and keeps the HID key buffers that the
//! board sends to the host.
//!
//! This crate is `no_std` so it can be used by both the AVR firmware and the
//! native CLI tool.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod debounce;
pub mod dial;
pub mod dispatch;
pub mod keycode;
pub mod keypad;
pub mod mailbox;
pub mod report;

pub use config::{Config, ConfigError, DialConfig, SwitchAction};
pub use debounce::{Debouncer, SwitchMasks};
pub use dial::{Dial, Direction};
pub use dispatch::{Dispatcher, SequenceEvent};
pub use keycode::{Keycode, LogicalKey, MediaKey};
pub use keypad::Keypad;
pub use mailbox::TickMailbox;
pub use report::{KeyReport, ReportSink};

/// Number of switch inputs (PB0..PB6).
pub const SWITCH_COUNT: usize = 7;

/// Raw sample with every switch open (active low, pull-ups enabled).
pub const RAW_IDLE: u8 = 0x7F;

/// Mask covering the valid switch bits of a sample.
pub const SWITCH_MASK: u8 = (1 << SWITCH_COUNT) - 1;
