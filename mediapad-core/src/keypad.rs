//! The whole per-tick pipeline behind one owned value.
//!
//! raw sample -> debounce -> {dispatch, dial} -> key buffers -> sink

use log::trace;

use crate::config::{Config, ConfigError};
use crate::debounce::{Debouncer, SwitchMasks};
use crate::dial::{Dial, Direction};
use crate::dispatch::{push_tap, Dispatcher, Events, SequenceEvent};
use crate::mailbox::TickMailbox;
use crate::report::{KeyReport, ReportSink};
use crate::SWITCH_MASK;

pub struct Keypad<S: ReportSink> {
    config: Config,
    debouncer: Debouncer,
    dispatcher: Dispatcher,
    dial: Dial,
    previous: SwitchMasks,
    report: KeyReport,
    sink: S,
}

impl<S: ReportSink> Keypad<S> {
    pub fn new(config: Config, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            debouncer: Debouncer::from_config(&config),
            dispatcher: Dispatcher::new(),
            dial: Dial::new(config.dial.line_a, config.dial.line_b),
            previous: SwitchMasks::RELEASED,
            report: KeyReport::empty(),
            config,
            sink,
        })
    }

    /// Process one raw sample (active low).
    ///
    /// Every press or release of a key sequence is committed as soon as it is
    /// applied, so a tap reaches the host as two reports. The tick always
    /// ends with one more commit, changed or not.
    pub fn tick(&mut self, raw: u8) {
        trace!("tick raw={:#04x}", raw);

        let current = self.debouncer.update(raw & SWITCH_MASK);

        let mut events = Events::new();
        self.dispatcher
            .dispatch(&self.config.actions, &current, &self.previous, &mut events);

        if let Some(direction) = self.dial.decode(&current) {
            let keys = match direction {
                Direction::Cw => self.config.dial.cw,
                Direction::Ccw => self.config.dial.ccw,
            };
            push_tap(&mut events, keys);
        }

        for event in &events {
            self.apply(*event);
            self.sink.commit(&self.report);
        }

        self.previous = current;
        self.sink.commit(&self.report);
    }

    /// Run one tick if the mailbox holds a sample. Returns whether it did.
    pub fn poll(&mut self, mailbox: &TickMailbox) -> bool {
        match mailbox.take() {
            Some(raw) => {
                self.tick(raw);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: SequenceEvent) {
        match event {
            SequenceEvent::Press(keys) => keys.iter().for_each(|&key| self.report.add_key(key)),
            SequenceEvent::Release(keys) => {
                keys.iter().for_each(|&key| self.report.remove_key(key))
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn masks(&self) -> SwitchMasks {
        self.previous
    }

    pub fn report(&self) -> &KeyReport {
        &self.report
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
