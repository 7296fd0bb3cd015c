//! Held-key buffers and the snapshot handed to the USB side.
//!
//! Modifiers live in a bitfield; other keyboard keys and media keys each
//! occupy one slot of a fixed array, first free slot first. When a buffer is
//! full further keys are dropped, the same as a 6KRO keyboard would.

use log::debug;

use crate::keycode::{Keycode, LogicalKey, MediaKey};

/// Keyboard key slots in a boot-protocol report.
pub const KEY_SLOTS: usize = 6;
/// Consumer-control slots.
pub const MEDIA_SLOTS: usize = 4;

/// Keys currently held, in wire form. Zero marks an empty slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyReport {
    pub modifiers: u8,
    pub keys: [u8; KEY_SLOTS],
    pub media: [u16; MEDIA_SLOTS],
}

/// Receives the report once per change and once at the end of every tick.
/// Implementations must tolerate repeated identical reports.
pub trait ReportSink {
    fn commit(&mut self, report: &KeyReport);
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn commit(&mut self, report: &KeyReport) {
        (**self).commit(report)
    }
}

impl KeyReport {
    pub const fn empty() -> Self {
        Self {
            modifiers: 0,
            keys: [0; KEY_SLOTS],
            media: [0; MEDIA_SLOTS],
        }
    }

    pub fn add_key(&mut self, key: LogicalKey) {
        match key {
            LogicalKey::Key(kc) if kc.is_modifier() => self.modifiers |= kc.modifier_bit(),
            LogicalKey::Key(kc) => {
                if !insert_slot(&mut self.keys, kc.code()) {
                    debug!("key buffer full, dropping {:?}", kc);
                }
            }
            LogicalKey::Media(mk) => {
                if !insert_slot(&mut self.media, mk.usage()) {
                    debug!("media buffer full, dropping {:?}", mk);
                }
            }
        }
    }

    pub fn remove_key(&mut self, key: LogicalKey) {
        match key {
            LogicalKey::Key(kc) if kc.is_modifier() => self.modifiers &= !kc.modifier_bit(),
            LogicalKey::Key(kc) => remove_slot(&mut self.keys, kc.code()),
            LogicalKey::Media(mk) => remove_slot(&mut self.media, mk.usage()),
        }
    }

    pub fn contains(&self, key: LogicalKey) -> bool {
        match key {
            LogicalKey::Key(kc) if kc.is_modifier() => self.modifiers & kc.modifier_bit() != 0,
            LogicalKey::Key(kc) => self.keys.contains(&kc.code()),
            LogicalKey::Media(mk) => self.media.contains(&mk.usage()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Standard keyboard report: modifiers, reserved byte, six key codes.
    pub fn keyboard_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.modifiers;
        bytes[2..].copy_from_slice(&self.keys);
        bytes
    }

    /// Consumer-control report: four 16-bit usages, little endian.
    pub fn media_bytes(&self) -> [u8; 2 * MEDIA_SLOTS] {
        let mut bytes = [0u8; 2 * MEDIA_SLOTS];
        for (chunk, usage) in bytes.chunks_exact_mut(2).zip(self.media) {
            chunk.copy_from_slice(&usage.to_le_bytes());
        }
        bytes
    }

    /// Held keys in slot order, modifiers first.
    pub fn held_keys(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        let modifiers = (0..8u8)
            .filter(move |bit| self.modifiers & (1u8 << *bit) != 0)
            .filter_map(|bit| Keycode::from_code(0xE0 + bit));
        let keys = self
            .keys
            .iter()
            .filter(|&&code| code != 0)
            .filter_map(|&code| Keycode::from_code(code));
        let media = self
            .media
            .iter()
            .filter(|&&usage| usage != 0)
            .filter_map(|&usage| MediaKey::from_usage(usage));

        modifiers
            .chain(keys)
            .map(LogicalKey::Key)
            .chain(media.map(LogicalKey::Media))
    }
}

/// Send-on-change bookkeeping for one wire report, for sinks whose
/// transport can refuse a write.
///
/// `last` is what the host has received. A refused report is kept in a
/// single retry slot and goes out before anything newer, so a press is never
/// overtaken by its own release. If the retry is refused again only the
/// newest state is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendFilter<const N: usize> {
    last: [u8; N],
    pending: Option<[u8; N]>,
}

impl<const N: usize> Default for SendFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SendFilter<N> {
    /// The host starts out with an all-zero report.
    pub const fn new() -> Self {
        Self {
            last: [0; N],
            pending: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand the current report over. `write` returns false when the
    /// transport did not take it.
    pub fn offer<F: FnMut(&[u8; N]) -> bool>(&mut self, data: &[u8; N], mut write: F) {
        if !self.flush(&mut write) {
            self.pending = (*data != self.last).then_some(*data);
            return;
        }
        if *data != self.last && !self.send(data, &mut write) {
            debug!("report write refused, will retry");
            self.pending = Some(*data);
        }
    }

    /// Retry a refused report. Returns false if it is still pending.
    pub fn flush<F: FnMut(&[u8; N]) -> bool>(&mut self, write: &mut F) -> bool {
        match self.pending.take() {
            None => true,
            Some(data) if self.send(&data, write) => true,
            Some(data) => {
                self.pending = Some(data);
                false
            }
        }
    }

    fn send<F: FnMut(&[u8; N]) -> bool>(&mut self, data: &[u8; N], write: &mut F) -> bool {
        if write(data) {
            self.last = *data;
            true
        } else {
            false
        }
    }
}

/// Put `value` in the first empty slot unless it is already held.
/// Returns false when there was no room.
fn insert_slot<T: Copy + Default + PartialEq>(slots: &mut [T], value: T) -> bool {
    if slots.contains(&value) {
        return true;
    }
    match slots.iter_mut().find(|slot| **slot == T::default()) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

fn remove_slot<T: Copy + Default + PartialEq>(slots: &mut [T], value: T) {
    for slot in slots.iter_mut().filter(|slot| **slot == value) {
        *slot = T::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTERS: [Keycode; 7] = [
        Keycode::A,
        Keycode::B,
        Keycode::C,
        Keycode::D,
        Keycode::E,
        Keycode::F,
        Keycode::G,
    ];

    #[test]
    fn adding_twice_keeps_one_copy() {
        let mut report = KeyReport::empty();
        report.add_key(Keycode::A.into());
        report.add_key(Keycode::A.into());
        assert_eq!(report.keys, [0x04, 0, 0, 0, 0, 0]);

        report.add_key(MediaKey::Mute.into());
        report.add_key(MediaKey::Mute.into());
        assert_eq!(report.media, [0xE2, 0, 0, 0]);
    }

    #[test]
    fn removing_an_absent_key_is_a_no_op() {
        let mut report = KeyReport::empty();
        report.add_key(Keycode::A.into());
        let before = report;
        report.remove_key(Keycode::Z.into());
        report.remove_key(MediaKey::VolumeUp.into());
        report.remove_key(Keycode::RAlt.into());
        assert_eq!(report, before);
    }

    #[test]
    fn modifiers_use_the_bitfield() {
        let mut report = KeyReport::empty();
        report.add_key(Keycode::LShift.into());
        report.add_key(Keycode::LShift.into());
        report.add_key(Keycode::RGui.into());
        assert_eq!(report.modifiers, 0b1000_0010);
        assert_eq!(report.keys, [0; KEY_SLOTS]);

        report.remove_key(Keycode::LShift.into());
        assert_eq!(report.modifiers, 0b1000_0000);
    }

    #[test]
    fn full_key_buffer_drops_the_seventh_key() {
        let mut report = KeyReport::empty();
        for kc in LETTERS {
            report.add_key(kc.into());
        }
        assert_eq!(report.keys, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
        assert!(!report.contains(Keycode::G.into()));

        // Freeing any slot makes room; first-fit reuses it
        report.remove_key(Keycode::C.into());
        report.add_key(Keycode::G.into());
        assert_eq!(report.keys, [0x04, 0x05, 0x0A, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn full_media_buffer_drops_the_fifth_key() {
        let mut report = KeyReport::empty();
        for mk in [
            MediaKey::Mute,
            MediaKey::VolumeUp,
            MediaKey::VolumeDown,
            MediaKey::PlayPause,
            MediaKey::NextTrack,
        ] {
            report.add_key(mk.into());
        }
        assert_eq!(report.media, [0xE2, 0xE9, 0xEA, 0xCD]);
    }

    #[test]
    fn wire_layouts() {
        let mut report = KeyReport::empty();
        report.add_key(Keycode::LCtrl.into());
        report.add_key(Keycode::N2.into());
        report.add_key(MediaKey::WwwHome.into());

        assert_eq!(report.keyboard_bytes(), [0x01, 0, 0x1F, 0, 0, 0, 0, 0]);
        assert_eq!(report.media_bytes(), [0x23, 0x02, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn held_keys_lists_modifiers_first() {
        let mut report = KeyReport::empty();
        report.add_key(MediaKey::PlayPause.into());
        report.add_key(Keycode::Q.into());
        report.add_key(Keycode::LShift.into());

        let held: Vec<LogicalKey> = report.held_keys().collect();
        assert_eq!(
            held,
            [
                LogicalKey::Key(Keycode::LShift),
                LogicalKey::Key(Keycode::Q),
                LogicalKey::Media(MediaKey::PlayPause),
            ]
        );
    }

    /// Transport double that refuses a write while `busy` is set.
    struct Endpoint {
        busy: bool,
        sent: Vec<[u8; 2]>,
    }

    impl Endpoint {
        fn new() -> Self {
            Self {
                busy: false,
                sent: Vec::new(),
            }
        }

        fn offer(&mut self, filter: &mut SendFilter<2>, data: [u8; 2]) {
            let busy = self.busy;
            let sent = &mut self.sent;
            filter.offer(&data, |d| {
                if !busy {
                    sent.push(*d);
                }
                !busy
            });
        }
    }

    #[test]
    fn unchanged_reports_are_not_resent() {
        let mut filter = SendFilter::new();
        let mut ep = Endpoint::new();
        ep.offer(&mut filter, [0, 0]);
        ep.offer(&mut filter, [1, 0]);
        ep.offer(&mut filter, [1, 0]);
        ep.offer(&mut filter, [0, 0]);
        assert_eq!(ep.sent, [[1, 0], [0, 0]]);
    }

    #[test]
    fn refused_press_goes_out_before_its_release() {
        let mut filter = SendFilter::new();
        let mut ep = Endpoint::new();

        ep.busy = true;
        ep.offer(&mut filter, [1, 0]);
        assert!(filter.is_pending());

        ep.busy = false;
        ep.offer(&mut filter, [0, 0]);
        assert_eq!(ep.sent, [[1, 0], [0, 0]]);
        assert!(!filter.is_pending());
    }

    #[test]
    fn flush_retries_without_a_new_report() {
        let mut filter = SendFilter::new();
        let mut ep = Endpoint::new();
        ep.busy = true;
        ep.offer(&mut filter, [5, 5]);

        let mut sent = Vec::new();
        assert!(filter.flush(&mut |d: &[u8; 2]| {
            sent.push(*d);
            true
        }));
        assert_eq!(sent, [[5, 5]]);
        assert!(!filter.is_pending());
    }

    #[test]
    fn long_stall_keeps_only_the_newest_state() {
        let mut filter = SendFilter::new();
        let mut ep = Endpoint::new();

        ep.busy = true;
        ep.offer(&mut filter, [1, 0]);
        ep.offer(&mut filter, [1, 2]);
        ep.busy = false;
        ep.offer(&mut filter, [1, 2]);
        assert_eq!(ep.sent, [[1, 2]]);

        // Back to what the host already has: nothing left to retry
        ep.busy = true;
        ep.offer(&mut filter, [0, 0]);
        ep.offer(&mut filter, [1, 2]);
        assert!(!filter.is_pending());
    }

    #[test]
    fn reset_forgets_the_host_state() {
        let mut filter = SendFilter::new();
        let mut ep = Endpoint::new();
        ep.offer(&mut filter, [3, 0]);
        filter.reset();
        ep.offer(&mut filter, [3, 0]);
        assert_eq!(ep.sent, [[3, 0], [3, 0]]);
    }
}
