//! Per-switch debounce and long-press logic.
//!
//! Each switch has one counter of consecutive identical raw samples, the
//! sample that broke the previous run included. The debounced state changes
//! on the sample that brings the counter to the debounce threshold;
//! if the switch is still held when the same counter reaches the long-press
//! threshold, the press is promoted to a long press. The counter stops there.

use crate::config::Config;
use crate::SWITCH_COUNT;

/// Debounced switch state, one bit per switch. 1 = pressed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitchMasks {
    pub pressed: u8,
    pub long_pressed: u8,
}

impl SwitchMasks {
    pub const RELEASED: SwitchMasks = SwitchMasks {
        pressed: 0,
        long_pressed: 0,
    };

    pub const fn is_pressed(&self, switch: usize) -> bool {
        self.pressed & (1 << switch) != 0
    }

    pub const fn is_long_pressed(&self, switch: usize) -> bool {
        self.long_pressed & (1 << switch) != 0
    }

    /// Bits that differ from `previous`.
    pub const fn changed_since(&self, previous: &SwitchMasks) -> SwitchMasks {
        SwitchMasks {
            pressed: self.pressed ^ previous.pressed,
            long_pressed: self.long_pressed ^ previous.long_pressed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct DebounceCell {
    /// Last raw level seen (active low: 1 = open).
    level: u8,
    /// Samples in the current run of `level`, saturating at the long-press
    /// threshold.
    since_change: u16,
}

impl DebounceCell {
    const IDLE: DebounceCell = DebounceCell {
        level: 1,
        since_change: 0,
    };
}

pub struct Debouncer {
    cells: [DebounceCell; SWITCH_COUNT],
    masks: SwitchMasks,
    debounce_ticks: u16,
    long_press_ticks: u16,
}

impl Debouncer {
    /// `long_press_ticks` must be greater than `debounce_ticks`; see
    /// [`Config::validate`].
    pub const fn new(debounce_ticks: u16, long_press_ticks: u16) -> Self {
        Self {
            cells: [DebounceCell::IDLE; SWITCH_COUNT],
            masks: SwitchMasks::RELEASED,
            debounce_ticks,
            long_press_ticks,
        }
    }

    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.debounce_ticks, config.long_press_ticks)
    }

    /// Feed one raw sample (active low, bit i = switch i).
    /// Returns the debounced state where a set bit means pressed.
    pub fn update(&mut self, raw: u8) -> SwitchMasks {
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let level = (raw >> i) & 0x01;

            if level != cell.level {
                // Any disagreement starts a new run with this sample
                cell.level = level;
                cell.since_change = 1;
            } else if cell.since_change < self.long_press_ticks {
                cell.since_change += 1;
            } else {
                continue;
            }

            let bit = 1u8 << i;
            let pressed = level == 0;

            if cell.since_change == self.debounce_ticks {
                if pressed {
                    self.masks.pressed |= bit;
                } else {
                    // A release drops the long press in the same tick
                    self.masks.pressed &= !bit;
                    self.masks.long_pressed &= !bit;
                }
            }

            if cell.since_change == self.long_press_ticks && pressed {
                self.masks.long_pressed |= bit;
            }
        }

        self.masks
    }

    pub fn masks(&self) -> SwitchMasks {
        self.masks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: u16 = 3;
    const LONG: u16 = 10;

    fn feed(debouncer: &mut Debouncer, raw: u8, ticks: usize) -> SwitchMasks {
        let mut masks = debouncer.masks();
        for _ in 0..ticks {
            masks = debouncer.update(raw);
        }
        masks
    }

    #[test]
    fn press_registers_on_the_threshold_tick() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);

        assert_eq!(debouncer.update(0x7F).pressed, 0);
        assert_eq!(debouncer.update(0x7E).pressed, 0);
        assert_eq!(debouncer.update(0x7E).pressed, 0);
        assert_eq!(debouncer.update(0x7E).pressed, 0b1);
        assert_eq!(debouncer.update(0x7E).pressed, 0b1);
    }

    #[test]
    fn bounce_restarts_the_count() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);

        feed(&mut debouncer, 0x7E, 2);
        debouncer.update(0x7F);
        assert_eq!(feed(&mut debouncer, 0x7E, 2).pressed, 0);
        assert_eq!(debouncer.update(0x7E).pressed, 0b1);
    }

    #[test]
    fn long_press_follows_press() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);

        let masks = feed(&mut debouncer, 0x7B, LONG as usize - 1);
        assert!(masks.is_pressed(2));
        assert!(!masks.is_long_pressed(2));

        let masks = debouncer.update(0x7B);
        assert!(masks.is_long_pressed(2));

        // Saturated: holding longer changes nothing
        assert_eq!(feed(&mut debouncer, 0x7B, 500), masks);
    }

    #[test]
    fn release_clears_long_press_in_the_same_tick() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);
        feed(&mut debouncer, 0x3F, LONG as usize);
        assert!(debouncer.masks().is_long_pressed(6));

        let masks = feed(&mut debouncer, 0x7F, DEBOUNCE as usize - 1);
        assert!(masks.is_pressed(6));
        assert!(masks.is_long_pressed(6));

        let masks = debouncer.update(0x7F);
        assert_eq!(masks, SwitchMasks::RELEASED);
    }

    #[test]
    fn switches_are_independent() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);
        feed(&mut debouncer, 0x7E, 2);
        // Switch 0 keeps counting while switch 3 starts over
        let masks = debouncer.update(0x76);
        assert_eq!(masks.pressed, 0b0001);
        let masks = feed(&mut debouncer, 0x76, 2);
        assert_eq!(masks.pressed, 0b1001);
    }

    #[test]
    fn long_press_implies_press_under_noise() {
        let mut debouncer = Debouncer::new(DEBOUNCE, LONG);
        let mut seed: u32 = 0x1234_5678;
        let mut raw = 0x7Fu8;

        for _ in 0..20_000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            // Flip one switch now and then so long runs still happen
            if (seed >> 16) % 7 == 0 {
                raw ^= 1 << ((seed >> 8) % 7);
            }
            let masks = debouncer.update(raw);
            assert_eq!(masks.long_pressed & !masks.pressed, 0);
        }
    }

    #[test]
    fn changed_since_is_a_xor() {
        let previous = SwitchMasks {
            pressed: 0b0101,
            long_pressed: 0b0001,
        };
        let current = SwitchMasks {
            pressed: 0b0110,
            long_pressed: 0b0000,
        };
        assert_eq!(
            current.changed_since(&previous),
            SwitchMasks {
                pressed: 0b0011,
                long_pressed: 0b0001
            }
        );
    }
}
