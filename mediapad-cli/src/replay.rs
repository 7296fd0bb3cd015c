//! Trace replay through the same mailbox path the firmware uses.

use anyhow::{Context, Result};
use log::info;

use mediapad_core::config::Config;
use mediapad_core::{KeyReport, Keypad, ReportSink, TickMailbox};

use crate::table;

/// Records one printable line per commit, tagged with its tick number.
struct LineSink {
    tick: usize,
    changes_only: bool,
    last: Option<KeyReport>,
    commits: usize,
    lines: Vec<String>,
}

impl ReportSink for LineSink {
    fn commit(&mut self, report: &KeyReport) {
        self.commits += 1;
        if self.changes_only && self.last.as_ref() == Some(report) {
            return;
        }
        self.last = Some(*report);
        self.lines.push(format_line(self.tick, report));
    }
}

fn format_line(tick: usize, report: &KeyReport) -> String {
    format!("{:>8}  {}", tick, table::report_line(report))
}

pub struct Replay {
    pub lines: Vec<String>,
    pub ticks: usize,
    pub commits: usize,
}

/// Run every sample through a fresh keypad. Ticks are numbered from 1.
pub fn replay(config: Config, samples: &[u8], changes_only: bool) -> Result<Replay> {
    let sink = LineSink {
        tick: 0,
        changes_only,
        last: None,
        commits: 0,
        lines: Vec::new(),
    };
    let mut keypad = Keypad::new(config, sink).context("invalid thresholds")?;
    info!(
        "replaying {} samples, debounce {} ticks, long press {} ticks",
        samples.len(),
        keypad.config().debounce_ticks,
        keypad.config().long_press_ticks
    );

    let mailbox = TickMailbox::new();
    for (i, &sample) in samples.iter().enumerate() {
        keypad.sink_mut().tick = i + 1;
        mailbox.post(sample);
        keypad.poll(&mailbox);
    }

    let sink = keypad.into_sink();
    Ok(Replay {
        lines: sink.lines,
        ticks: samples.len(),
        commits: sink.commits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediapad_core::config::DEFAULT;
    use mediapad_core::RAW_IDLE;

    const SWITCH0_DOWN: u8 = RAW_IDLE & !0b1;

    fn line(tick: usize, keys: &str) -> String {
        format!("{:>8}  {}", tick, keys)
    }

    fn tap_trace() -> Vec<u8> {
        let mut samples = vec![SWITCH0_DOWN; 20];
        samples.extend([RAW_IDLE; 3]);
        samples
    }

    #[test]
    fn tap_prints_press_release_and_idle() {
        let replay = replay(DEFAULT, &tap_trace(), false).unwrap();

        assert_eq!(replay.ticks, 23);
        // one commit per tick plus the two halves of the tap
        assert_eq!(replay.commits, 25);
        assert_eq!(replay.lines.len(), 25);
        assert_eq!(replay.lines[0], line(1, "-"));
        assert_eq!(replay.lines[22], line(23, "Home(www)"));
        assert_eq!(replay.lines[23], line(23, "-"));
        assert_eq!(replay.lines[24], line(23, "-"));
    }

    #[test]
    fn changes_only_collapses_repeats() {
        let replay = replay(DEFAULT, &tap_trace(), true).unwrap();

        assert_eq!(replay.commits, 25);
        assert_eq!(
            replay.lines,
            [line(1, "-"), line(23, "Home(www)"), line(23, "-")]
        );
    }

    #[test]
    fn bad_thresholds_are_reported() {
        let config = Config {
            debounce_ticks: 0,
            ..DEFAULT
        };
        let err = replay(config, &tap_trace(), false).err().unwrap();
        assert_eq!(err.to_string(), "invalid thresholds");
    }

    #[test]
    fn empty_trace_commits_nothing() {
        let replay = replay(DEFAULT, &[], false).unwrap();
        assert_eq!(replay.ticks, 0);
        assert_eq!(replay.commits, 0);
        assert!(replay.lines.is_empty());
    }
}
