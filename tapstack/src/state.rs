//! Runtime state of the keyboard.
use crate::event::KeyPos;
use crate::keyboard::held_buffer::HeldBuffer;
use crate::keyboard::oneshot::OneShotState;
use crate::layer_stack::LayerStack;
use crate::storage::{DefaultLayerStore, LayerStorage};
use crate::tap_dance::TapDanceTable;
use crate::tap_hold::DualRoleTable;

/// Everything that changes while the keyboard runs, owned by [`crate::keyboard::Keyboard`].
pub struct FirmwareState<S: LayerStorage, const ROW: usize, const COL: usize> {
    pub(crate) layers: LayerStack,
    pub(crate) default_layer: DefaultLayerStore<S>,
    pub(crate) dual_role: DualRoleTable,
    pub(crate) tap_dance: TapDanceTable,
    pub(crate) one_shot: OneShotState,
    /// Events waiting for an undecided dual-role key
    pub(crate) held_buffer: HeldBuffer,
    /// The layer each pressed key was resolved on, `None` if the key is up
    pub(crate) layer_cache: [[Option<u8>; COL]; ROW],
}

impl<S: LayerStorage, const ROW: usize, const COL: usize> FirmwareState<S, ROW, COL> {
    /// Create the state with the default layer loaded from the store
    pub fn new(default_layer: DefaultLayerStore<S>) -> Self {
        Self {
            layers: LayerStack::new(default_layer.layer()),
            default_layer,
            dual_role: DualRoleTable::new(),
            tap_dance: TapDanceTable::new(),
            one_shot: OneShotState::default(),
            held_buffer: HeldBuffer::new(),
            layer_cache: [[None; COL]; ROW],
        }
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn default_layer(&self) -> u8 {
        self.default_layer.layer()
    }

    pub fn dual_role(&self) -> &DualRoleTable {
        &self.dual_role
    }

    pub fn tap_dance(&self) -> &TapDanceTable {
        &self.tap_dance
    }

    /// The one-shot layer waiting for the next key press
    pub fn one_shot_layer(&self) -> Option<u8> {
        self.one_shot.active().map(|l| l.layer)
    }

    /// Number of events held back by an undecided dual-role key
    pub fn buffered_events(&self) -> usize {
        self.held_buffer.len()
    }

    /// The layer a pressed key was resolved on
    pub fn pressed_layer(&self, pos: KeyPos) -> Option<u8> {
        self.layer_cache
            .get(pos.row as usize)
            .and_then(|r| r.get(pos.col as usize))
            .copied()
            .flatten()
    }

    pub(crate) fn cache_slot(&mut self, pos: KeyPos) -> Option<&mut Option<u8>> {
        self.layer_cache
            .get_mut(pos.row as usize)
            .and_then(|r| r.get_mut(pos.col as usize))
    }
}
