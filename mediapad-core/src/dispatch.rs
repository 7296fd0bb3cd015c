//! Press / long-press / release policy.
//!
//! Turns edges of the debounced masks into press and release events for the
//! key sequences configured per switch.

use heapless::Vec;
use log::debug;

use crate::config::SwitchAction;
use crate::debounce::SwitchMasks;
use crate::keycode::LogicalKey;
use crate::SWITCH_COUNT;

/// A tap on every switch plus one dial tap.
pub const MAX_EVENTS: usize = 2 * SWITCH_COUNT + 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequenceEvent {
    Press(&'static [LogicalKey]),
    Release(&'static [LogicalKey]),
}

pub type Events = Vec<SequenceEvent, MAX_EVENTS>;

/// Push a press immediately followed by a release.
pub fn push_tap(events: &mut Events, keys: &'static [LogicalKey]) {
    if keys.is_empty() {
        return;
    }
    push(events, SequenceEvent::Press(keys));
    push(events, SequenceEvent::Release(keys));
}

/// One tick emits at most a tap per switch plus a dial tap, so the buffer
/// never overflows; a full buffer would lose a release and leave keys stuck.
fn push(events: &mut Events, event: SequenceEvent) {
    let pushed = events.push(event).is_ok();
    debug_assert!(pushed, "sequence event buffer full");
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwitchPhase {
    Released,
    /// Short keys are held down.
    ShortHeld,
    /// Pressed, long keys configured, long-press time not reached yet.
    AwaitingLongOrRelease,
    /// Long keys are held down.
    LongHeld,
}

pub struct Dispatcher {
    phases: [SwitchPhase; SWITCH_COUNT],
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self {
            phases: [SwitchPhase::Released; SWITCH_COUNT],
        }
    }

    pub fn phase(&self, switch: usize) -> SwitchPhase {
        self.phases[switch]
    }

    /// Evaluate every switch against this tick's edges. Events are appended
    /// to `events` in switch order.
    pub fn dispatch(
        &mut self,
        actions: &[SwitchAction; SWITCH_COUNT],
        current: &SwitchMasks,
        previous: &SwitchMasks,
        events: &mut Events,
    ) {
        let changed = current.changed_since(previous);

        for (i, (action, phase)) in actions.iter().zip(self.phases.iter_mut()).enumerate() {
            let bit = 1u8 << i;
            let press_edge = changed.pressed & bit != 0;
            let long_edge = changed.long_pressed & bit != 0;
            let pressed = current.pressed & bit != 0;
            let long_pressed = current.long_pressed & bit != 0;

            if press_edge && pressed && *phase == SwitchPhase::Released {
                if action.has_long() {
                    *phase = SwitchPhase::AwaitingLongOrRelease;
                } else if !action.short.is_empty() {
                    debug!("switch {} pressed", i);
                    push(events, SequenceEvent::Press(action.short));
                    *phase = SwitchPhase::ShortHeld;
                }
            }

            if long_edge && long_pressed && *phase == SwitchPhase::AwaitingLongOrRelease {
                debug!("switch {} long pressed", i);
                push(events, SequenceEvent::Press(action.long));
                *phase = SwitchPhase::LongHeld;
            }

            if press_edge && !pressed {
                match *phase {
                    SwitchPhase::LongHeld => {
                        debug!("switch {} released from long press", i);
                        push(events, SequenceEvent::Release(action.long));
                    }
                    SwitchPhase::AwaitingLongOrRelease => {
                        debug!("switch {} tapped", i);
                        push_tap(events, action.short);
                    }
                    SwitchPhase::ShortHeld => {
                        debug!("switch {} released", i);
                        push(events, SequenceEvent::Release(action.short));
                    }
                    SwitchPhase::Released => {}
                }
                *phase = SwitchPhase::Released;
            }
        }
    }
}
