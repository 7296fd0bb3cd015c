//! Key codes sent to the host.
//!
//! Standard keys come from the Keyboard/Keypad usage page (0x07), media keys
//! from the Consumer usage page (0x0C). Both end up in different HID reports,
//! so [`LogicalKey`] keeps them apart as an explicit tag.

/// USB HID keycodes.
/// See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Keycode {
    // Letters
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    // Numbers
    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    // Control keys
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Function keys
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    // Modifiers (used in the modifier byte, not in keycode array)
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl Keycode {
    pub const ALL: [Keycode; 70] = [
        Keycode::A, Keycode::B, Keycode::C, Keycode::D, Keycode::E, Keycode::F,
        Keycode::G, Keycode::H, Keycode::I, Keycode::J, Keycode::K, Keycode::L,
        Keycode::M, Keycode::N, Keycode::O, Keycode::P, Keycode::Q, Keycode::R,
        Keycode::S, Keycode::T, Keycode::U, Keycode::V, Keycode::W, Keycode::X,
        Keycode::Y, Keycode::Z,
        Keycode::N1, Keycode::N2, Keycode::N3, Keycode::N4, Keycode::N5,
        Keycode::N6, Keycode::N7, Keycode::N8, Keycode::N9, Keycode::N0,
        Keycode::Enter, Keycode::Escape, Keycode::Backspace, Keycode::Tab, Keycode::Space,
        Keycode::F1, Keycode::F2, Keycode::F3, Keycode::F4, Keycode::F5, Keycode::F6,
        Keycode::F7, Keycode::F8, Keycode::F9, Keycode::F10, Keycode::F11, Keycode::F12,
        Keycode::Home, Keycode::PageUp, Keycode::Delete, Keycode::End, Keycode::PageDown,
        Keycode::Right, Keycode::Left, Keycode::Down, Keycode::Up,
        Keycode::LCtrl, Keycode::LShift, Keycode::LAlt, Keycode::LGui,
        Keycode::RCtrl, Keycode::RShift, Keycode::RAlt, Keycode::RGui,
    ];

    /// Raw HID usage ID.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a keycode by its HID usage ID.
    pub fn from_code(code: u8) -> Option<Keycode> {
        Self::ALL.iter().copied().find(|kc| kc.code() == code)
    }

    /// Check if this keycode is a modifier (LCtrl..RGui).
    pub const fn is_modifier(self) -> bool {
        let v = self as u8;
        v >= 0xE0 && v <= 0xE7
    }

    /// Get the modifier bit mask (bit 0 = LCtrl, bit 7 = RGui).
    pub const fn modifier_bit(self) -> u8 {
        if self.is_modifier() {
            1 << (self as u8 - 0xE0)
        } else {
            0
        }
    }

    /// Short label for printed keymaps.
    pub fn display_name(self) -> &'static str {
        match self {
            Keycode::A => "A",
            Keycode::B => "B",
            Keycode::C => "C",
            Keycode::D => "D",
            Keycode::E => "E",
            Keycode::F => "F",
            Keycode::G => "G",
            Keycode::H => "H",
            Keycode::I => "I",
            Keycode::J => "J",
            Keycode::K => "K",
            Keycode::L => "L",
            Keycode::M => "M",
            Keycode::N => "N",
            Keycode::O => "O",
            Keycode::P => "P",
            Keycode::Q => "Q",
            Keycode::R => "R",
            Keycode::S => "S",
            Keycode::T => "T",
            Keycode::U => "U",
            Keycode::V => "V",
            Keycode::W => "W",
            Keycode::X => "X",
            Keycode::Y => "Y",
            Keycode::Z => "Z",
            Keycode::N1 => "1",
            Keycode::N2 => "2",
            Keycode::N3 => "3",
            Keycode::N4 => "4",
            Keycode::N5 => "5",
            Keycode::N6 => "6",
            Keycode::N7 => "7",
            Keycode::N8 => "8",
            Keycode::N9 => "9",
            Keycode::N0 => "0",
            Keycode::Enter => "Ent",
            Keycode::Escape => "Esc",
            Keycode::Backspace => "Bksp",
            Keycode::Tab => "Tab",
            Keycode::Space => "Spc",
            Keycode::F1 => "F1",
            Keycode::F2 => "F2",
            Keycode::F3 => "F3",
            Keycode::F4 => "F4",
            Keycode::F5 => "F5",
            Keycode::F6 => "F6",
            Keycode::F7 => "F7",
            Keycode::F8 => "F8",
            Keycode::F9 => "F9",
            Keycode::F10 => "F10",
            Keycode::F11 => "F11",
            Keycode::F12 => "F12",
            Keycode::Home => "Home",
            Keycode::PageUp => "PgUp",
            Keycode::Delete => "Del",
            Keycode::End => "End",
            Keycode::PageDown => "PgDn",
            Keycode::Right => "Right",
            Keycode::Left => "Left",
            Keycode::Down => "Down",
            Keycode::Up => "Up",
            Keycode::LCtrl => "Ctrl",
            Keycode::LShift => "Shift",
            Keycode::LAlt => "Alt",
            Keycode::LGui => "Gui",
            Keycode::RCtrl => "RCtrl",
            Keycode::RShift => "RShift",
            Keycode::RAlt => "RAlt",
            Keycode::RGui => "RGui",
        }
    }
}

/// Consumer control usages (Consumer Page 0x0C).
///
/// Translate.pdf from Microsoft lists a few that are missing from the usage
/// tables, most notably play/pause.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum MediaKey {
    Power = 0x30,
    Sleep = 0x32,
    NextTrack = 0xB5,
    PrevTrack = 0xB6,
    Stop = 0xB7,
    PlayPause = 0xCD,
    Mute = 0xE2,
    VolumeUp = 0xE9,
    VolumeDown = 0xEA,
    /// AC Search. Android hosts trigger it on release, not press.
    WwwSearch = 0x221,
    /// AC Home.
    WwwHome = 0x223,
}

impl MediaKey {
    pub const ALL: [MediaKey; 11] = [
        MediaKey::Power,
        MediaKey::Sleep,
        MediaKey::NextTrack,
        MediaKey::PrevTrack,
        MediaKey::Stop,
        MediaKey::PlayPause,
        MediaKey::Mute,
        MediaKey::VolumeUp,
        MediaKey::VolumeDown,
        MediaKey::WwwSearch,
        MediaKey::WwwHome,
    ];

    pub const fn usage(self) -> u16 {
        self as u16
    }

    pub fn from_usage(usage: u16) -> Option<MediaKey> {
        Self::ALL.iter().copied().find(|mk| mk.usage() == usage)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MediaKey::Power => "Power",
            MediaKey::Sleep => "Sleep",
            MediaKey::NextTrack => "Next",
            MediaKey::PrevTrack => "Prev",
            MediaKey::Stop => "Stop",
            MediaKey::PlayPause => "Play/Pause",
            MediaKey::Mute => "Mute",
            MediaKey::VolumeUp => "VolUp",
            MediaKey::VolumeDown => "VolDn",
            MediaKey::WwwSearch => "Search",
            MediaKey::WwwHome => "Home(www)",
        }
    }
}

/// A key a switch can send: either a keyboard key (regular or modifier) or
/// a consumer-control key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogicalKey {
    Key(Keycode),
    Media(MediaKey),
}

impl LogicalKey {
    /// Tag bit marking a media usage in the packed 16-bit encoding.
    pub const MEDIA_FLAG: u16 = 0x1000;

    /// Packed encoding: keyboard codes as-is, media usages with
    /// [`Self::MEDIA_FLAG`] set.
    pub const fn encode(self) -> u16 {
        match self {
            LogicalKey::Key(kc) => kc.code() as u16,
            LogicalKey::Media(mk) => Self::MEDIA_FLAG | mk.usage(),
        }
    }

    pub fn decode(raw: u16) -> Option<LogicalKey> {
        if raw & Self::MEDIA_FLAG != 0 {
            MediaKey::from_usage(raw & 0x0FFF).map(LogicalKey::Media)
        } else if raw <= 0xFF {
            Keycode::from_code(raw as u8).map(LogicalKey::Key)
        } else {
            None
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LogicalKey::Key(kc) => kc.display_name(),
            LogicalKey::Media(mk) => mk.display_name(),
        }
    }
}

impl From<Keycode> for LogicalKey {
    fn from(kc: Keycode) -> Self {
        LogicalKey::Key(kc)
    }
}

impl From<MediaKey> for LogicalKey {
    fn from(mk: MediaKey) -> Self {
        LogicalKey::Media(mk)
    }
}
