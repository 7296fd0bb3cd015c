//! Two-line detent dial decoding.
//!
//! At every detent both lines read the same level. Between detents they
//! differ; which line flipped first gives the direction. A click counts only
//! once both lines agree again on the opposite level.

use log::debug;

use crate::debounce::SwitchMasks;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Ccw,
    Cw,
}

pub struct Dial {
    line_a: usize,
    line_b: usize,
    /// Level of line A at the last detent.
    position: bool,
    rotating: bool,
    direction: Direction,
}

impl Dial {
    /// The resting position starts at "released", like the debouncer's
    /// output. A dial parked on the other detent is picked up by the resync
    /// path on the first ticks.
    pub const fn new(line_a: usize, line_b: usize) -> Self {
        Self {
            line_a,
            line_b,
            position: false,
            rotating: false,
            direction: Direction::Ccw,
        }
    }

    /// Advance with this tick's debounced state. Returns a direction when a
    /// full detent-to-detent click completed.
    pub fn decode(&mut self, masks: &SwitchMasks) -> Option<Direction> {
        let a = masks.is_pressed(self.line_a);
        let b = masks.is_pressed(self.line_b);

        if a != b {
            // Between detents. Direction is fixed by the first line to move.
            if !self.rotating {
                self.rotating = true;
                self.direction = if a != self.position {
                    Direction::Cw
                } else {
                    Direction::Ccw
                };
            }
            return None;
        }

        if self.rotating {
            self.rotating = false;
            if a == self.position {
                // Bounced back to where it started
                return None;
            }
            self.position = a;
            debug!("dial click {:?}", self.direction);
            return Some(self.direction);
        }

        if a != self.position {
            // Both lines moved while we weren't looking; follow them silently
            debug!("dial resync to {}", a);
            self.position = a;
        }
        None
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: usize = 1;
    const B: usize = 5;

    fn lines(a: bool, b: bool) -> SwitchMasks {
        SwitchMasks {
            pressed: ((a as u8) << A) | ((b as u8) << B),
            long_pressed: 0,
        }
    }

    #[test]
    fn full_clockwise_detent_clicks_once() {
        let mut dial = Dial::new(A, B);
        assert_eq!(dial.decode(&lines(true, false)), None);
        assert!(dial.is_rotating());
        assert_eq!(dial.decode(&lines(true, false)), None);
        assert_eq!(dial.decode(&lines(true, true)), Some(Direction::Cw));
        assert_eq!(dial.decode(&lines(true, true)), None);
    }

    #[test]
    fn full_counter_clockwise_detent_clicks_once() {
        let mut dial = Dial::new(A, B);
        assert_eq!(dial.decode(&lines(false, true)), None);
        assert_eq!(dial.decode(&lines(true, true)), Some(Direction::Ccw));

        // And back from the high detent
        assert_eq!(dial.decode(&lines(true, false)), None);
        assert_eq!(dial.decode(&lines(false, false)), Some(Direction::Ccw));
    }

    #[test]
    fn clockwise_from_the_high_detent() {
        let mut dial = Dial::new(A, B);
        dial.decode(&lines(true, false));
        dial.decode(&lines(true, true));

        assert_eq!(dial.decode(&lines(false, true)), None);
        assert_eq!(dial.decode(&lines(false, false)), Some(Direction::Cw));
    }

    #[test]
    fn partial_rotation_emits_nothing() {
        let mut dial = Dial::new(A, B);
        assert_eq!(dial.decode(&lines(true, false)), None);
        assert_eq!(dial.decode(&lines(false, false)), None);
        assert!(!dial.is_rotating());

        // The origin detent is unchanged: a following full click still works
        assert_eq!(dial.decode(&lines(false, true)), None);
        assert_eq!(dial.decode(&lines(true, true)), Some(Direction::Ccw));
    }

    #[test]
    fn direction_is_latched_at_start_of_motion() {
        let mut dial = Dial::new(A, B);
        dial.decode(&lines(true, false));
        // Lines swap without passing a detent (a dropped tick)
        dial.decode(&lines(false, true));
        assert_eq!(dial.decode(&lines(true, true)), Some(Direction::Cw));
    }

    #[test]
    fn missed_click_resyncs_silently() {
        let mut dial = Dial::new(A, B);
        assert_eq!(dial.decode(&lines(true, true)), None);

        // Now resting at the high detent; the next click is measured from it
        assert_eq!(dial.decode(&lines(false, true)), None);
        assert_eq!(dial.decode(&lines(false, false)), Some(Direction::Cw));
    }
}
