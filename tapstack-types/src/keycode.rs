use crate::modifier::ModifierCombination;

/// Keyboard/keypad page usage ids from the HID Usage Tables.
///
/// Ref: <https://www.usb.org/sites/default/files/documents/hut1_12v2.pdf#page=53>
///
/// Only the usages a keymap can reference are listed. Media and mouse usages
/// share the same namespace as in QMK, the HID reporter maps them to the
/// consumer/mouse reports.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    /// Reserved, no-key.
    No = 0x00,
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
    /// `1` and `!`
    Kc1 = 0x1E,
    /// `2` and `@`
    Kc2 = 0x1F,
    /// `3` and `#`
    Kc3 = 0x20,
    /// `4` and `$`
    Kc4 = 0x21,
    /// `5` and `%`
    Kc5 = 0x22,
    /// `6` and `^`
    Kc6 = 0x23,
    /// `7` and `&`
    Kc7 = 0x24,
    /// `8` and `*`
    Kc8 = 0x25,
    /// `9` and `(`
    Kc9 = 0x26,
    /// `0` and `)`
    Kc0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    /// `-` and `_`
    Minus = 0x2D,
    /// `=` and `+`
    Equal = 0x2E,
    /// `[` and `{`
    LeftBracket = 0x2F,
    /// `]` and `}`
    RightBracket = 0x30,
    /// `\` and `|`
    Backslash = 0x31,
    /// `;` and `:`
    Semicolon = 0x33,
    /// `'` and `"`
    Quote = 0x34,
    /// `` ` `` and `~`
    Grave = 0x35,
    /// `,` and `<`
    Comma = 0x36,
    /// `.` and `>`
    Dot = 0x37,
    /// `/` and `?`
    Slash = 0x38,
    CapsLock = 0x39,
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
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    NumLock = 0x53,
    Application = 0x65,
    AudioMute = 0xA8,
    AudioVolUp = 0xA9,
    AudioVolDown = 0xAA,
    MediaNextTrack = 0xAB,
    MediaPrevTrack = 0xAC,
    MediaStop = 0xAD,
    MediaPlayPause = 0xAE,
    MouseUp = 0xCD,
    MouseDown = 0xCE,
    MouseLeft = 0xCF,
    MouseRight = 0xD0,
    /// Mouse Button 1(Left)
    MouseBtn1 = 0xD1,
    /// Mouse Button 2(Right)
    MouseBtn2 = 0xD2,
    /// Mouse Button 3(Middle)
    MouseBtn3 = 0xD3,
    /// Mouse Button 4(Back)
    MouseBtn4 = 0xD4,
    /// Mouse Button 5(Forward)
    MouseBtn5 = 0xD5,
    MouseWheelUp = 0xD9,
    MouseWheelDown = 0xDA,
    MouseWheelLeft = 0xDB,
    MouseWheelRight = 0xDC,
    MouseAccel0 = 0xDD,
    MouseAccel1 = 0xDE,
    MouseAccel2 = 0xDF,
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl KeyCode {
    /// Returns `true` if the keycode is a modifier keycode
    pub fn is_modifier(self) -> bool {
        KeyCode::LCtrl <= self && self <= KeyCode::RGui
    }

    /// Returns `true` if the keycode is a mouse keycode
    pub fn is_mouse_key(self) -> bool {
        KeyCode::MouseUp <= self && self <= KeyCode::MouseAccel2
    }

    /// Returns `true` if the keycode belongs to the consumer page when reported
    pub fn is_consumer(self) -> bool {
        KeyCode::AudioMute <= self && self <= KeyCode::MediaPlayPause
    }

    /// The modifier combination a modifier keycode stands for, empty for other keycodes
    pub fn to_modifier(self) -> ModifierCombination {
        match self {
            KeyCode::LCtrl => ModifierCombination::LCTRL,
            KeyCode::LShift => ModifierCombination::LSHIFT,
            KeyCode::LAlt => ModifierCombination::LALT,
            KeyCode::LGui => ModifierCombination::LGUI,
            KeyCode::RCtrl => ModifierCombination::RCTRL,
            KeyCode::RShift => ModifierCombination::RSHIFT,
            KeyCode::RAlt => ModifierCombination::RALT,
            KeyCode::RGui => ModifierCombination::RGUI,
            _ => ModifierCombination::new(),
        }
    }
}
