#![allow(dead_code)]

use mediapad_core::config::{Config, DEFAULT};
use mediapad_core::{KeyReport, Keypad, ReportSink, RAW_IDLE};

// Init logger for tests
#[ctor::ctor]
fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Keeps every report the keypad commits.
#[derive(Default)]
pub struct RecordingSink {
    pub commits: Vec<KeyReport>,
}

impl ReportSink for RecordingSink {
    fn commit(&mut self, report: &KeyReport) {
        self.commits.push(*report);
    }
}

impl RecordingSink {
    /// Commits with consecutive duplicates collapsed, i.e. what a host sees
    /// from a sink that only transmits changes.
    pub fn distinct(&self) -> Vec<KeyReport> {
        let mut out: Vec<KeyReport> = Vec::new();
        for report in &self.commits {
            if out.last() != Some(report) {
                out.push(*report);
            }
        }
        out
    }
}

pub fn keypad(config: Config) -> Keypad<RecordingSink> {
    Keypad::new(config, RecordingSink::default()).expect("test config is valid")
}

pub fn default_keypad() -> Keypad<RecordingSink> {
    keypad(DEFAULT)
}

/// Raw sample with the given switches closed.
pub fn closed(switches: &[usize]) -> u8 {
    switches
        .iter()
        .fold(RAW_IDLE, |raw, &switch| raw & !(1 << switch))
}

pub fn run(keypad: &mut Keypad<RecordingSink>, raw: u8, ticks: usize) {
    for _ in 0..ticks {
        keypad.tick(raw);
    }
}

pub fn clear(keypad: &mut Keypad<RecordingSink>) {
    keypad.sink_mut().commits.clear();
}
