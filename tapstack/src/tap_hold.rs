//! Dual-role (tap/hold) keys.
//!
//! A dual-role key is undecided after it's pressed. Releasing it before the
//! tap-hold timeout, with no other key pressed in between, makes it a tap.
//! Otherwise it becomes a hold, which lasts until the key is released.
//! State is kept per key position so dual-role keys can be nested.
use embassy_time::{Duration, Instant};
use heapless::index_map::FnvIndexMap;
use tapstack_types::action::Action;

use crate::DUAL_ROLE_MAX_NUM;
use crate::event::KeyPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DualRoleState {
    /// The key is up
    Idle,
    /// Pressed, neither tap nor hold yet
    Pending { pressed_at: Instant },
    HoldDecided,
    /// Released while pending. Tap is decided at release and the entry is removed,
    /// so this is only returned by [`DualRoleTable::release`], never stored.
    TapDecided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DualRoleKey {
    pub tap: Action,
    pub hold: Action,
    pub state: DualRoleState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DualRoleTableFull;

/// Dual-role keys which are currently down.
#[derive(Default)]
pub struct DualRoleTable {
    keys: FnvIndexMap<KeyPos, DualRoleKey, DUAL_ROLE_MAX_NUM>,
}

impl DualRoleTable {
    pub fn new() -> Self {
        Self {
            keys: FnvIndexMap::new(),
        }
    }

    pub fn state(&self, pos: KeyPos) -> DualRoleState {
        self.keys.get(&pos).map_or(DualRoleState::Idle, |k| k.state)
    }

    /// A dual-role key is pressed and becomes pending
    pub fn press(&mut self, pos: KeyPos, tap: Action, hold: Action, now: Instant) -> Result<(), DualRoleTableFull> {
        let key = DualRoleKey {
            tap,
            hold,
            state: DualRoleState::Pending { pressed_at: now },
        };
        self.keys.insert(pos, key).map(|_| ()).map_err(|_| DualRoleTableFull)
    }

    /// Decide hold for a pending key, returns the hold action which should be pressed now
    pub fn decide_hold(&mut self, pos: KeyPos) -> Option<Action> {
        let key = self.keys.get_mut(&pos)?;
        match key.state {
            DualRoleState::Pending { .. } => {
                key.state = DualRoleState::HoldDecided;
                Some(key.hold)
            }
            _ => None,
        }
    }

    /// The key is released, the entry is removed.
    ///
    /// A pending key is decided as tap. Returns the decision and the action to finish:
    /// the tap action to tap, or the hold action to release.
    pub fn release(&mut self, pos: KeyPos) -> Option<(DualRoleState, Action)> {
        let key = self.keys.remove(&pos)?;
        match key.state {
            DualRoleState::Pending { .. } => Some((DualRoleState::TapDecided, key.tap)),
            DualRoleState::HoldDecided => Some((DualRoleState::HoldDecided, key.hold)),
            DualRoleState::Idle | DualRoleState::TapDecided => None,
        }
    }

    /// Returns `true` if any key is undecided
    pub fn has_pending(&self) -> bool {
        self.keys
            .values()
            .any(|k| matches!(k.state, DualRoleState::Pending { .. }))
    }

    /// Pending keys other than `pos`, with their press time
    pub fn pending_except(&self, pos: KeyPos) -> impl Iterator<Item = (KeyPos, Instant)> + '_ {
        self.pending().filter(move |(p, _)| *p != pos)
    }

    /// The earliest pending key and the time it turns into a hold
    pub fn next_deadline(&self, timeout: Duration) -> Option<(KeyPos, Instant)> {
        self.pending()
            .map(|(p, t)| (p, t.checked_add(timeout).unwrap_or(Instant::MAX)))
            .min_by_key(|&(_, d)| d)
    }

    /// Undecided keys with their press time
    pub fn pending(&self) -> impl Iterator<Item = (KeyPos, Instant)> + '_ {
        self.keys.iter().filter_map(|(p, k)| match k.state {
            DualRoleState::Pending { pressed_at } => Some((*p, pressed_at)),
            _ => None,
        })
    }
}
