use tapstack_types::action::{Action, KeyAction};

use crate::config::BehaviorConfig;
use crate::event::KeyPos;
use crate::tap_dance::TapDance;
use crate::tri_layer::TriLayer;

/// Invalid keymap or behavior configuration, the keyboard refuses to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapError {
    /// A layer which can become the default layer has a transparent key
    TransparentInBaseLayer { layer: u8, pos: KeyPos },
    /// An action refers to a layer which doesn't exist
    LayerOutOfRange(u8),
    /// `KeyAction::TapDance` refers to a tap dance which isn't defined
    UnknownTapDance(u8),
    /// A tap dance without any action
    EmptyTapDance(u8),
    InvalidTriLayer(TriLayer),
    InvalidDefaultLayer(u8),
    /// Rows, columns and layers are addressed by `u8`
    TooLarge,
}

/// Keymap represents the stack of layers.
///
/// The conception of Keymap is borrowed from qmk: <https://docs.qmk.fm/#/keymap>.
///
/// The action of a key is looked up by `(layer, row, col)`. The keymap is
/// validated once in [`KeyMap::new`] and never changes afterwards.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
    /// Layers that are allowed to be the default layer
    base_capable: [bool; NUM_LAYER],
    pub(crate) behavior: BehaviorConfig,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyMap<'a, ROW, COL, NUM_LAYER> {
    pub fn new(
        layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
        behavior: BehaviorConfig,
    ) -> Result<Self, KeymapError> {
        const MAX: usize = u8::MAX as usize + 1;
        if ROW > MAX || COL > MAX || NUM_LAYER > MAX {
            return Err(KeymapError::TooLarge);
        }
        if behavior.default_layer as usize >= NUM_LAYER {
            return Err(KeymapError::InvalidDefaultLayer(behavior.default_layer));
        }
        if let Some(tri) = behavior.tri_layer {
            if !tri.is_valid(NUM_LAYER) {
                return Err(KeymapError::InvalidTriLayer(tri));
            }
        }

        let mut base_capable = [false; NUM_LAYER];
        base_capable[behavior.default_layer as usize] = true;

        for (id, dance) in behavior.tap_dance.tap_dances.iter().enumerate() {
            if dance.actions.is_empty() {
                return Err(KeymapError::EmptyTapDance(id as u8));
            }
            for action in dance.actions.iter() {
                Self::check_action(action, &mut base_capable)?;
            }
        }

        for layer in layers.iter() {
            for cell in layer.iter().flatten() {
                if let KeyAction::TapDance(id) = *cell {
                    if id as usize >= behavior.tap_dance.tap_dances.len() {
                        return Err(KeymapError::UnknownTapDance(id));
                    }
                }
                for action in cell.basic_actions().iter().flatten() {
                    Self::check_action(action, &mut base_capable)?;
                }
            }
        }

        for (l, layer) in layers.iter().enumerate().filter(|(l, _)| base_capable[*l]) {
            for (row, keys) in layer.iter().enumerate() {
                if let Some(col) = keys.iter().position(|k| *k == KeyAction::Transparent) {
                    let pos = KeyPos::new(row as u8, col as u8);
                    error!("Layer {} can be the default layer but has a transparent key at {:?}", l, pos);
                    return Err(KeymapError::TransparentInBaseLayer { layer: l as u8, pos });
                }
            }
        }

        Ok(Self {
            layers,
            base_capable,
            behavior,
        })
    }

    fn check_action(action: &Action, base_capable: &mut [bool; NUM_LAYER]) -> Result<(), KeymapError> {
        let Some(layer) = action.layer() else {
            return Ok(());
        };
        if layer as usize >= NUM_LAYER {
            return Err(KeymapError::LayerOutOfRange(layer));
        }
        if let Action::DefaultLayer(l) = action {
            base_capable[*l as usize] = true;
        }
        Ok(())
    }

    pub fn get_keymap_config(&self) -> (usize, usize, usize) {
        (ROW, COL, NUM_LAYER)
    }

    /// Returns `true` if the position is inside the matrix
    pub fn contains(&self, pos: KeyPos) -> bool {
        (pos.row as usize) < ROW && (pos.col as usize) < COL
    }

    /// Action at the given layer and position, `KeyAction::No` if out of range
    pub fn action_at(&self, layer: u8, pos: KeyPos) -> KeyAction {
        self.layers
            .get(layer as usize)
            .and_then(|l| l.get(pos.row as usize))
            .and_then(|r| r.get(pos.col as usize))
            .copied()
            .unwrap_or(KeyAction::No)
    }

    /// Returns `true` if the layer is allowed to be the default layer
    pub fn is_base_capable(&self, layer: u8) -> bool {
        self.base_capable.get(layer as usize).copied().unwrap_or(false)
    }

    pub fn behavior(&self) -> &BehaviorConfig {
        &self.behavior
    }

    pub fn tap_dances(&self) -> &[TapDance] {
        &self.behavior.tap_dance.tap_dances
    }
}

#[cfg(test)]
mod tests {
    use tapstack_types::keycode::KeyCode;

    use super::*;

    const A: KeyAction = KeyAction::Single(Action::Key(KeyCode::A));
    const TRNS: KeyAction = KeyAction::Transparent;

    #[test]
    fn test_transparent_in_default_layer() {
        let layers = [[[A, TRNS]], [[TRNS, A]]];
        let err = KeyMap::new(&layers, BehaviorConfig::default()).err();
        assert_eq!(
            err,
            Some(KeymapError::TransparentInBaseLayer {
                layer: 0,
                pos: KeyPos::new(0, 1)
            })
        );
    }

    #[test]
    fn test_transparent_in_default_layer_target() {
        let layers = [[[A, KeyAction::Single(Action::DefaultLayer(1))]], [[TRNS, A]]];
        let err = KeyMap::new(&layers, BehaviorConfig::default()).err();
        assert_eq!(
            err,
            Some(KeymapError::TransparentInBaseLayer {
                layer: 1,
                pos: KeyPos::new(0, 0)
            })
        );

        // Transparent keys are fine in layers which are never the default layer
        let layers = [[[A, KeyAction::Single(Action::LayerOn(1))]], [[TRNS, A]]];
        let keymap = KeyMap::new(&layers, BehaviorConfig::default()).unwrap();
        assert!(keymap.is_base_capable(0));
        assert!(!keymap.is_base_capable(1));
    }

    #[test]
    fn test_out_of_range() {
        let layers = [[[A, KeyAction::TapHold(Action::Key(KeyCode::B), Action::LayerOn(2))]], [[A, A]]];
        assert_eq!(
            KeyMap::new(&layers, BehaviorConfig::default()).err(),
            Some(KeymapError::LayerOutOfRange(2))
        );

        let layers = [[[A, KeyAction::TapDance(0)]]];
        assert_eq!(
            KeyMap::new(&layers, BehaviorConfig::default()).err(),
            Some(KeymapError::UnknownTapDance(0))
        );

        let layers = [[[A, A]]];
        let behavior = BehaviorConfig {
            default_layer: 1,
            ..Default::default()
        };
        assert_eq!(KeyMap::new(&layers, behavior).err(), Some(KeymapError::InvalidDefaultLayer(1)));

        let behavior = BehaviorConfig {
            tri_layer: Some(TriLayer::new(0, 0, 0)),
            ..Default::default()
        };
        assert_eq!(
            KeyMap::new(&layers, behavior).err(),
            Some(KeymapError::InvalidTriLayer(TriLayer::new(0, 0, 0)))
        );
    }

    #[test]
    fn test_tap_dance_actions_are_checked() {
        let layers = [[[A, KeyAction::TapDance(0)]], [[TRNS, A]]];
        let mut behavior = BehaviorConfig::default();
        behavior
            .tap_dance
            .tap_dances
            .push(TapDance::double(Action::Key(KeyCode::A), Action::DefaultLayer(1)))
            .unwrap();
        assert_eq!(
            KeyMap::new(&layers, behavior.clone()).err(),
            Some(KeymapError::TransparentInBaseLayer {
                layer: 1,
                pos: KeyPos::new(0, 0)
            })
        );

        behavior.tap_dance.tap_dances[0] = TapDance::new(&[]);
        assert_eq!(KeyMap::new(&layers, behavior).err(), Some(KeymapError::EmptyTapDance(0)));
    }

    #[test]
    fn test_action_at() {
        let layers = [[[A, KeyAction::No]]];
        let keymap = KeyMap::new(&layers, BehaviorConfig::default()).unwrap();
        assert_eq!(keymap.action_at(0, KeyPos::new(0, 0)), A);
        assert_eq!(keymap.action_at(0, KeyPos::new(3, 0)), KeyAction::No);
        assert_eq!(keymap.action_at(5, KeyPos::new(0, 0)), KeyAction::No);
        assert!(!keymap.contains(KeyPos::new(0, 2)));
        assert_eq!(keymap.get_keymap_config(), (1, 2, 1));
    }
}
