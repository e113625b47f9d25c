//! Keyboard actions and behaviors.
//!
//! Actions represent what happens when a key position is pressed, from simple
//! key presses to dual-role keys and tap dances.
//!
//! Key types:
//! - [`Action`] - Single operations that a keyboard executes on press and undoes on release
//! - [`KeyAction`] - What a keymap cell holds, including the composite behaviors

use crate::keycode::KeyCode;
use crate::modifier::ModifierCombination;

/// A KeyAction is the action at a keyboard position, stored in keymap.
///
/// It can be a single action like triggering a key, or a composite behavior
/// like tap/hold, which is resolved to single actions at runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// No action. A `No` cell on an upper layer lets lower layers shine through as well.
    No,
    /// Transparent action, next layer will be checked.
    Transparent,
    /// A single action, such as triggering a key, or activating a layer.
    /// Action is triggered when pressed and cancelled when released.
    Single(Action),
    /// Dual-role key: (tap_action, hold_action)
    TapHold(Action, Action),
    /// Tap dance action, references a tap dance definition by index.
    TapDance(u8),
}

impl KeyAction {
    /// Returns `true` if the layer stack should keep searching below this cell
    pub fn falls_through(&self) -> bool {
        matches!(self, KeyAction::No | KeyAction::Transparent)
    }

    /// All basic actions referenced directly by this cell
    pub fn basic_actions(&self) -> [Option<Action>; 2] {
        match *self {
            KeyAction::Single(a) => [Some(a), None],
            KeyAction::TapHold(tap, hold) => [Some(tap), Some(hold)],
            KeyAction::No | KeyAction::Transparent | KeyAction::TapDance(_) => [None, None],
        }
    }
}

/// A single basic action that a keyboard can execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Do nothing
    No,
    /// A normal key stroke
    Key(KeyCode),
    /// Hold a modifier combination
    Modifier(ModifierCombination),
    /// Key stroke with modifier combination triggered.
    KeyWithModifier(KeyCode, ModifierCombination),
    /// Activate a layer while the key is held
    LayerOn(u8),
    /// Toggle a layer, it stays on after the key is released
    LayerToggle(u8),
    /// Activate a layer for the next key press only
    LayerOneShot(u8),
    /// Set (and persist) the default layer
    DefaultLayer(u8),
}

impl Action {
    /// The layer this action refers to, if any
    pub fn layer(&self) -> Option<u8> {
        match *self {
            Action::LayerOn(l) | Action::LayerToggle(l) | Action::LayerOneShot(l) | Action::DefaultLayer(l) => Some(l),
            _ => None,
        }
    }

    /// Actions which have a lasting effect between press and release.
    ///
    /// When such an action is chosen by a tap dance, it is kept active until
    /// the tap dance key is released instead of being tapped.
    pub fn is_held_state(&self) -> bool {
        matches!(
            self,
            Action::Modifier(_) | Action::KeyWithModifier(_, _) | Action::LayerOn(_)
        )
    }
}
