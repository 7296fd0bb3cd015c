//! Plain-text rendering of the compiled-in configuration and of key reports.

use std::fmt::Write;

use mediapad_core::config::{Config, SWITCH_LABELS};
use mediapad_core::{KeyReport, LogicalKey};

/// Key names joined with `+`, or `-` for none.
pub fn key_names(keys: impl IntoIterator<Item = LogicalKey>) -> String {
    let names: Vec<&str> = keys.into_iter().map(LogicalKey::display_name).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join("+")
    }
}

/// Key names followed by their packed codes, e.g. `Shift+Q [0x00E1 0x0014]`.
pub fn keys_with_codes(keys: &[LogicalKey]) -> String {
    if keys.is_empty() {
        return "-".to_string();
    }
    let codes: Vec<String> = keys
        .iter()
        .map(|key| format!("{:#06X}", key.encode()))
        .collect();
    format!("{} [{}]", key_names(keys.iter().copied()), codes.join(" "))
}

pub fn report_line(report: &KeyReport) -> String {
    key_names(report.held_keys())
}

/// Switch table, dial mapping and timing.
pub fn render_config(config: &Config) -> String {
    let mut out = String::new();
    let dial_lines = [config.dial.line_a, config.dial.line_b];

    let _ = writeln!(out, "{:<6} {:<10} {:<28} {}", "switch", "label", "short", "long");
    for (i, action) in config.actions.iter().enumerate() {
        let (short, long) = if dial_lines.contains(&i) {
            ("(dial)".to_string(), String::new())
        } else {
            (keys_with_codes(action.short), keys_with_codes(action.long))
        };
        let _ = writeln!(out, "PB{:<4} {:<10} {:<28} {}", i, SWITCH_LABELS[i], short, long);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "dial: A=PB{} B=PB{}  cw {}  ccw {}",
        config.dial.line_a,
        config.dial.line_b,
        keys_with_codes(config.dial.cw),
        keys_with_codes(config.dial.ccw),
    );

    let period_us = config.tick_period_us();
    let _ = writeln!(
        out,
        "tick: {} us ({:.2} Hz, timer0 clk/{})",
        period_us,
        1_000_000.0 / period_us as f64,
        config.timer_prescaler.divisor(),
    );
    let _ = writeln!(
        out,
        "debounce: {} ticks ({} ms)",
        config.debounce_ticks,
        config.ticks_to_ms(config.debounce_ticks)
    );
    let _ = writeln!(
        out,
        "long press: {} ticks ({} ms)",
        config.long_press_ticks,
        config.ticks_to_ms(config.long_press_ticks)
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediapad_core::config::DEFAULT;
    use mediapad_core::{Keycode, MediaKey};

    #[test]
    fn empty_report_prints_a_dash() {
        assert_eq!(report_line(&KeyReport::empty()), "-");
    }

    #[test]
    fn report_lists_modifiers_first() {
        let mut report = KeyReport::empty();
        report.add_key(LogicalKey::Key(Keycode::Q));
        report.add_key(LogicalKey::Key(Keycode::LShift));
        report.add_key(LogicalKey::Media(MediaKey::VolumeUp));

        assert_eq!(report_line(&report), "Shift+Q+VolUp");
    }

    #[test]
    fn chords_split_back_into_their_keys() {
        let keys = [
            LogicalKey::Key(Keycode::LCtrl),
            LogicalKey::Media(MediaKey::VolumeDown),
            LogicalKey::Media(MediaKey::PlayPause),
        ];
        let line = key_names(keys);
        let names: Vec<&str> = line.split('+').collect();
        assert_eq!(names, ["Ctrl", "VolDn", "Play/Pause"]);
    }

    #[test]
    fn codes_use_the_packed_encoding() {
        let keys = [
            LogicalKey::Key(Keycode::LShift),
            LogicalKey::Media(MediaKey::WwwHome),
        ];
        assert_eq!(keys_with_codes(&keys), "Shift+Home(www) [0x00E1 0x1223]");
        assert_eq!(keys_with_codes(&[]), "-");
    }

    #[test]
    fn default_table_shows_every_switch_and_timing() {
        let text = render_config(&DEFAULT);
        for label in SWITCH_LABELS {
            assert!(text.contains(label), "missing {label}");
        }
        assert_eq!(text.matches("(dial)").count(), 2);
        assert!(text.contains("Search [0x1221]"));
        assert!(text.contains("cw VolUp [0x10E9]  ccw VolDn [0x10EA]"));
        assert!(text.contains("tick: 4096 us (244.14 Hz"));
        assert!(text.contains("long press: 160 ticks (655 ms)"));
        assert!(text.contains("debounce: 3 ticks (12 ms)"));
    }
}
