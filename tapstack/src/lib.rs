//! # tapstack
//!
//! The input-processing core of a keyboard firmware: raw key transitions go in,
//! resolved key/modifier/layer effects come out.
//!
//! Processing is done by [`keyboard::Keyboard`], which owns every piece of
//! runtime state ([`state::FirmwareState`]): the [`layer_stack::LayerStack`],
//! the dual-role ([`tap_hold`]) and tap-dance ([`tap_dance`]) state machines
//! and the [`storage::DefaultLayerStore`]. It is driven by one cooperative loop,
//! either hand written or [`runner::KeyboardTask`].
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub use embassy_time::{Duration, Instant};
pub use heapless;
pub use tapstack_types as types;
pub use types::{action, keycode, modifier};

pub mod config;
pub mod effect;
pub mod event;
pub mod keyboard;
pub mod keymap;
pub mod layer_stack;
pub mod layout_macro;
pub mod layouts;
pub mod runner;
pub mod state;
pub mod storage;
pub mod tap_dance;
pub mod tap_hold;
pub mod tri_layer;

/// Maximum number of simultaneously active `(layer, mode)` entries above the default layer
pub const LAYER_STACK_SIZE: usize = 16;
/// Maximum number of dual-role keys that can be undecided or held at once, must be a power of 2
pub const DUAL_ROLE_MAX_NUM: usize = 8;
/// Maximum number of tap dance definitions
pub const TAP_DANCE_MAX_NUM: usize = 8;
/// Maximum number of actions bound to one tap dance, indexed by tap count
pub const TAP_DANCE_MAX_TAPS: usize = 4;
/// Capacity of the buffer which holds events while a dual-role key is undecided in timeout mode
pub const HELD_BUFFER_SIZE: usize = 16;
/// Most effects a single action produces: tapping a key with modifiers, or a one-shot layer replacing another
pub const MAX_ACTION_EFFECTS: usize = 4;
/// Upper bound of the effects of handling one key event, including the undecided keys it interrupts.
///
/// The keyboard stops replaying buffered events and expiring timers when an
/// [`effect::EffectSink`] has less room than this, and resumes on the next tick.
pub const MAX_EVENT_EFFECTS: usize = (DUAL_ROLE_MAX_NUM + TAP_DANCE_MAX_NUM + 2) * MAX_ACTION_EFFECTS;
/// Capacity of the effect buffer filled by one event or tick in [`runner::KeyboardTask`]
pub const EFFECT_BUFFER_SIZE: usize = 2 * MAX_EVENT_EFFECTS;

const _: () = assert!(
    EFFECT_BUFFER_SIZE >= MAX_EVENT_EFFECTS,
    "The effect buffer must hold the effects of at least one key event"
);
