//! Ordered set of active layers above the default layer.
//!
//! Every entry is a `(layer, mode)` pair with an activation count. The entry
//! activated most recently sits on top and wins when a position is resolved.
//! The default layer is kept separately at the bottom and is never removed.
use heapless::Vec;
use tapstack_types::action::KeyAction;

use crate::LAYER_STACK_SIZE;
use crate::event::KeyPos;
use crate::keymap::KeyMap;

/// Why a layer is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerMode {
    /// Active while the activating key is held
    Momentary,
    /// Active until toggled off again
    Toggle,
    /// Active for the next key press only
    OneShot,
    /// Derived from two other active layers
    Tri,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerError {
    /// No free slot for another `(layer, mode)` entry
    StackFull { layer: u8, mode: LayerMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct LayerEntry {
    layer: u8,
    mode: LayerMode,
    count: u8,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerStack {
    default_layer: u8,
    /// Bottom first
    entries: Vec<LayerEntry, LAYER_STACK_SIZE>,
}

impl LayerStack {
    pub fn new(default_layer: u8) -> Self {
        Self {
            default_layer,
            entries: Vec::new(),
        }
    }

    /// The layer at the bottom of the stack
    pub fn default_layer(&self) -> u8 {
        self.default_layer
    }

    pub(crate) fn set_default_layer(&mut self, layer: u8) {
        self.default_layer = layer;
    }

    fn position(&self, layer: u8, mode: LayerMode) -> Option<usize> {
        self.entries.iter().position(|e| e.layer == layer && e.mode == mode)
    }

    /// Add one activation of `(layer, mode)` and move the entry to the top.
    pub fn activate(&mut self, layer: u8, mode: LayerMode) -> Result<(), LayerError> {
        match self.position(layer, mode) {
            Some(i) => {
                self.entries[i..].rotate_left(1);
                if let Some(top) = self.entries.last_mut() {
                    top.count = top.count.saturating_add(1);
                }
                Ok(())
            }
            None => self
                .entries
                .push(LayerEntry { layer, mode, count: 1 })
                .map_err(|_| LayerError::StackFull { layer, mode }),
        }
    }

    /// Remove one activation of `(layer, mode)`.
    ///
    /// Returns `false` if `(layer, mode)` was never activated.
    pub fn deactivate(&mut self, layer: u8, mode: LayerMode) -> bool {
        let Some(i) = self.position(layer, mode) else {
            return false;
        };
        if self.entries[i].count > 1 {
            self.entries[i].count -= 1;
        } else {
            self.entries.remove(i);
        }
        true
    }

    /// Remove every activation of `(layer, mode)` at once.
    pub fn clear(&mut self, layer: u8, mode: LayerMode) -> bool {
        match self.position(layer, mode) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Flip the toggle entry of `layer`, returns the new toggle state
    pub fn toggle(&mut self, layer: u8) -> Result<bool, LayerError> {
        if self.clear(layer, LayerMode::Toggle) {
            Ok(false)
        } else {
            self.activate(layer, LayerMode::Toggle).map(|_| true)
        }
    }

    /// Move an existing entry to the top without changing its count
    pub fn raise(&mut self, layer: u8, mode: LayerMode) -> bool {
        match self.position(layer, mode) {
            Some(i) => {
                self.entries[i..].rotate_left(1);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if any entry holds the layer. The default layer only counts when it's also on the stack.
    pub fn is_active(&self, layer: u8) -> bool {
        self.entries.iter().any(|e| e.layer == layer)
    }

    pub fn is_active_in(&self, layer: u8, mode: LayerMode) -> bool {
        self.position(layer, mode).is_some()
    }

    /// Number of outstanding activations of `(layer, mode)`
    pub fn activations(&self, layer: u8, mode: LayerMode) -> u8 {
        self.position(layer, mode).map_or(0, |i| self.entries[i].count)
    }

    /// Index of the highest entry holding the layer, counted from the bottom
    pub(crate) fn top_index(&self, layer: u8) -> Option<usize> {
        self.entries.iter().rposition(|e| e.layer == layer)
    }

    pub(crate) fn index_of(&self, layer: u8, mode: LayerMode) -> Option<usize> {
        self.position(layer, mode)
    }

    /// Active entries, top first
    pub fn active_layers(&self) -> impl Iterator<Item = (u8, LayerMode)> + '_ {
        self.entries.iter().rev().map(|e| (e.layer, e.mode))
    }

    /// The layer which has the highest priority
    pub fn highest_layer(&self) -> u8 {
        self.entries.last().map_or(self.default_layer, |e| e.layer)
    }

    /// Find the action of `pos`, scanning from the top of the stack down to the default layer.
    ///
    /// `Transparent` and `No` cells are skipped. The layer the action came from is returned as well.
    pub fn resolve<const ROW: usize, const COL: usize, const NUM_LAYER: usize>(
        &self,
        keymap: &KeyMap<'_, ROW, COL, NUM_LAYER>,
        pos: KeyPos,
    ) -> (KeyAction, u8) {
        for entry in self.entries.iter().rev() {
            let action = keymap.action_at(entry.layer, pos);
            if !action.falls_through() {
                return (action, entry.layer);
            }
        }
        (keymap.action_at(self.default_layer, pos), self.default_layer)
    }
}
