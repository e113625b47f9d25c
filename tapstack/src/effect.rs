//! Resolved output of the keyboard.
//!
//! The HID reporter (or whatever consumes the output) receives [`Effect`]s in
//! the exact order they were produced and applies them.
use tapstack_types::keycode::KeyCode;
use tapstack_types::modifier::ModifierCombination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Press or release a keycode
    Key { code: KeyCode, pressed: bool },
    /// Set or clear a modifier combination
    Modifier {
        modifiers: ModifierCombination,
        active: bool,
    },
    /// The layer became active
    LayerActivated(u8),
    /// The layer is no longer active
    LayerDeactivated(u8),
    /// The base layer has been switched
    DefaultLayerChanged(u8),
}

impl Effect {
    pub const fn key_press(code: KeyCode) -> Self {
        Effect::Key { code, pressed: true }
    }

    pub const fn key_release(code: KeyCode) -> Self {
        Effect::Key { code, pressed: false }
    }

    pub const fn modifier_set(modifiers: ModifierCombination) -> Self {
        Effect::Modifier {
            modifiers,
            active: true,
        }
    }

    pub const fn modifier_clear(modifiers: ModifierCombination) -> Self {
        Effect::Modifier {
            modifiers,
            active: false,
        }
    }
}

/// Receiver of the effects produced by the keyboard.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);

    /// Number of effects which can still be emitted without loss
    fn remaining(&self) -> usize {
        usize::MAX
    }
}

impl<const N: usize> EffectSink for heapless::Vec<Effect, N> {
    fn emit(&mut self, effect: Effect) {
        if let Err(e) = self.push(effect) {
            error!("Effect buffer full, dropping {:?}", e);
        }
    }

    fn remaining(&self) -> usize {
        N - self.len()
    }
}
