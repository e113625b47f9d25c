//! Dvorak/Qwerty layout for the Planck (4x12) keyboard.
//!
//! Lower and Raise together open the Nexus layer, which switches the
//! persisted default layer between Qwerty and Dvorak.
use heapless::Vec;

use crate::action::{Action, KeyAction};
use crate::config::BehaviorConfig;
use crate::keycode::KeyCode;
use crate::modifier::ModifierCombination;
use crate::tap_dance::TapDance;
use crate::tri_layer::TriLayer;
use crate::{a, df, k, layer, lt, mo, mt, shifted, td, wm};

pub const ROW: usize = 4;
pub const COL: usize = 12;
pub const NUM_LAYER: usize = 8;

pub const QWERTY: u8 = 0;
pub const DVORAK: u8 = 1;
pub const LOWER: u8 = 2;
pub const RAISE: u8 = 3;
pub const TOUCH_CURSOR: u8 = 4;
pub const MOUSE_CURSOR: u8 = 5;
pub const NUMPAD: u8 = 6;
pub const NEXUS: u8 = 7;

/// Tap once for Escape, twice for Caps Lock
pub const ESC_CAPS: u8 = 0;

const RALT: ModifierCombination = ModifierCombination::RALT;
/// Right alt with shift, the shift bit follows the side of the combination
const RALT_SHIFT: ModifierCombination = ModifierCombination::new_from(true, false, true, true, false);
const LCTRL: ModifierCombination = ModifierCombination::LCTRL;
const LSHIFT: ModifierCombination = ModifierCombination::LSHIFT;
const LGUI: ModifierCombination = ModifierCombination::LGUI;

/// Tap to space, hold for the touch cursor layer
const TC_SPC: KeyAction = lt!(TOUCH_CURSOR, Space);
const ESC_CPL: KeyAction = td!(ESC_CAPS);
const CTL_TAB: KeyAction = mt!(Tab, LCTRL);
const CTL_MNS: KeyAction = mt!(Minus, LCTRL);
const CTL_QUT: KeyAction = mt!(Quote, LCTRL);
const CTL_ENT: KeyAction = mt!(Enter, LCTRL);
const SFT_ENT: KeyAction = mt!(Enter, LSHIFT);
const SFT_F1: KeyAction = mt!(F1, LSHIFT);
const SFT_F12: KeyAction = mt!(F12, LSHIFT);
const DEL_GUI: KeyAction = mt!(Delete, LGUI);

// Right alt variants avoid dead keys on international layouts
const LV_QUOT: KeyAction = wm!(Quote, RALT);
const LV_GRV: KeyAction = wm!(Grave, RALT);
const LV_TILD: KeyAction = wm!(Grave, RALT_SHIFT);
const LV_CIRC: KeyAction = wm!(Kc6, RALT_SHIFT);
const LN_CEDL: KeyAction = wm!(Comma, RALT);

const TRNS: KeyAction = a!(Transparent);
const XXXX: KeyAction = a!(No);

#[rustfmt::skip]
pub const fn get_keymap() -> [[[KeyAction; COL]; ROW]; NUM_LAYER] {
    [
        // Qwerty
        layer!([
            [ESC_CPL, k!(Q), k!(W), k!(E), k!(R), k!(T), k!(Y), k!(U), k!(I), k!(O), k!(P), k!(Backspace)],
            [CTL_TAB, k!(A), k!(S), k!(D), k!(F), k!(G), k!(H), k!(J), k!(K), k!(L), k!(Semicolon), CTL_QUT],
            [k!(LShift), k!(Z), k!(X), k!(C), k!(V), k!(B), k!(N), k!(M), k!(Comma), k!(Dot), k!(Slash), SFT_ENT],
            [k!(LCtrl), k!(LGui), mo!(NUMPAD), k!(LAlt), mo!(LOWER), TC_SPC, TC_SPC, mo!(RAISE), k!(RAlt), mo!(NUMPAD), DEL_GUI, CTL_ENT]
        ]),
        // Dvorak
        layer!([
            [ESC_CPL, LV_QUOT, k!(Comma), k!(Dot), k!(P), k!(Y), k!(F), k!(G), k!(C), k!(R), k!(L), k!(Backspace)],
            [CTL_TAB, k!(A), k!(O), k!(E), k!(U), k!(I), k!(D), k!(H), k!(T), k!(N), k!(S), CTL_MNS],
            [k!(LShift), k!(Semicolon), k!(Q), k!(J), k!(K), k!(X), k!(B), k!(M), k!(W), k!(V), k!(Z), SFT_ENT],
            [k!(LCtrl), k!(LGui), mo!(NUMPAD), k!(LAlt), mo!(LOWER), TC_SPC, TC_SPC, mo!(RAISE), k!(RAlt), mo!(NUMPAD), DEL_GUI, CTL_ENT]
        ]),
        // Lower
        layer!([
            [k!(Home), k!(Left), k!(Down), k!(Up), k!(Right), k!(End), shifted!(Minus), shifted!(LeftBracket), shifted!(RightBracket), shifted!(Slash), shifted!(Equal), k!(Delete)],
            [LV_GRV, k!(Kc1), k!(Kc2), k!(Kc3), k!(Kc4), k!(Kc5), k!(Kc6), k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0), k!(Backslash)],
            [TRNS, k!(AudioMute), k!(AudioVolUp), k!(AudioVolDown), k!(MediaPrevTrack), k!(MediaPlayPause), k!(MediaNextTrack), k!(PageUp), k!(PageDown), k!(Insert), k!(PrintScreen), TRNS],
            [TRNS, TRNS, TRNS, TRNS, TRNS, mo!(MOUSE_CURSOR), mo!(MOUSE_CURSOR), TRNS, TRNS, TRNS, TRNS, TRNS]
        ]),
        // Raise
        layer!([
            [TRNS, shifted!(Quote), k!(Grave), shifted!(Grave), shifted!(Kc6), k!(Quote), LN_CEDL, k!(LeftBracket), k!(RightBracket), k!(Slash), k!(Equal), k!(Delete)],
            [LV_TILD, shifted!(Kc1), shifted!(Kc2), shifted!(Kc3), shifted!(Kc4), shifted!(Kc5), LV_CIRC, shifted!(Kc7), shifted!(Kc8), shifted!(Kc9), shifted!(Kc0), shifted!(Backslash)],
            [SFT_F1, k!(F2), k!(F3), k!(F4), k!(F5), k!(F6), k!(F7), k!(F8), k!(F9), k!(F10), k!(F11), SFT_F12],
            [TRNS, TRNS, TRNS, TRNS, TRNS, mo!(MOUSE_CURSOR), mo!(MOUSE_CURSOR), TRNS, TRNS, TRNS, TRNS, TRNS]
        ]),
        // Touch cursor
        layer!([
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, k!(Insert), k!(Home), k!(Up), k!(End), k!(Backspace), TRNS],
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, k!(PageUp), k!(Left), k!(Down), k!(Right), XXXX, k!(Space)],
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, k!(PageDown), k!(Delete), XXXX, XXXX, TRNS, TRNS],
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS]
        ]),
        // Mouse cursor
        layer!([
            [TRNS, TRNS, TRNS, k!(MouseAccel0), TRNS, TRNS, TRNS, k!(MouseWheelLeft), k!(MouseUp), k!(MouseWheelRight), k!(MouseBtn2), TRNS],
            [TRNS, TRNS, k!(MouseAccel2), k!(MouseBtn2), k!(MouseBtn1), k!(MouseAccel1), k!(MouseWheelUp), k!(MouseLeft), k!(MouseDown), k!(MouseRight), k!(MouseBtn4), k!(MouseBtn5)],
            [TRNS, TRNS, TRNS, TRNS, k!(MouseBtn3), TRNS, k!(MouseWheelDown), k!(MouseBtn1), TRNS, TRNS, k!(MouseBtn3), TRNS],
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS]
        ]),
        // Numpad
        layer!([
            [LV_TILD, k!(Kc1), k!(Kc2), k!(Kc3), k!(Kc4), k!(Kc5), k!(Kc6), k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0), TRNS],
            [k!(Escape), shifted!(Kc2), k!(A), k!(B), k!(C), shifted!(Kc0), shifted!(Kc9), k!(Kc4), k!(Kc5), k!(Kc6), shifted!(Backslash), k!(Enter)],
            [shifted!(Kc7), shifted!(Kc3), k!(D), k!(E), k!(F), k!(RightBracket), k!(LeftBracket), k!(Kc1), k!(Kc2), k!(Kc3), k!(Slash), shifted!(Kc8)],
            [TRNS, TRNS, TRNS, TRNS, k!(X), TRNS, TRNS, k!(Kc0), k!(Dot), k!(Comma), shifted!(Equal), k!(Minus)]
        ]),
        // Nexus, active while both Lower and Raise are held
        layer!([
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, k!(Delete)],
            [TRNS, TRNS, TRNS, XXXX, XXXX, XXXX, XXXX, df!(QWERTY), TRNS, df!(DVORAK), TRNS, TRNS],
            [TRNS, XXXX, XXXX, XXXX, XXXX, XXXX, XXXX, TRNS, TRNS, TRNS, TRNS, TRNS],
            [TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, TRNS, XXXX]
        ]),
    ]
}

/// Behavior of the layout: Esc/Caps tap dance and the Lower/Raise/Nexus tri layer
pub fn get_behavior_config() -> BehaviorConfig {
    let mut tap_dances = Vec::new();
    let _ = tap_dances.push(TapDance::double(
        Action::Key(KeyCode::Escape),
        Action::Key(KeyCode::CapsLock),
    ));

    let mut config = BehaviorConfig {
        default_layer: QWERTY,
        tri_layer: Some(TriLayer::new(LOWER, RAISE, NEXUS)),
        ..Default::default()
    };
    config.tap_dance.tap_dances = tap_dances;
    config
}
