//! Tap dance: one key, different actions depending on how many times it's tapped.
//!
//! Every tap dance id has its own state. A dance counts taps until it's
//! resolved by one of:
//! - the tap dance timeout elapsing after the last release,
//! - another key being pressed,
//! - the key being held longer than the hold threshold.
use embassy_time::Instant;
use heapless::Vec;
use tapstack_types::action::Action;

use crate::config::TapDanceConfig;
use crate::event::KeyPos;
use crate::{TAP_DANCE_MAX_NUM, TAP_DANCE_MAX_TAPS};

/// Actions bound to a tap dance, the n-th action is selected by n taps.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDance {
    pub actions: Vec<Action, TAP_DANCE_MAX_TAPS>,
}

impl TapDance {
    /// Actions after the `TAP_DANCE_MAX_TAPS`-th are ignored.
    pub fn new(actions: &[Action]) -> Self {
        if actions.len() > TAP_DANCE_MAX_TAPS {
            warn!("Tap dance has {} actions, only {} are used", actions.len(), TAP_DANCE_MAX_TAPS);
        }
        Self {
            actions: actions.iter().copied().take(TAP_DANCE_MAX_TAPS).collect(),
        }
    }

    /// Single tap for `single`, double tap for `double`
    pub fn double(single: Action, double: Action) -> Self {
        Self::new(&[single, double])
    }

    /// Action for `taps` taps. Counts beyond the table pick the last action.
    pub fn action_for(&self, taps: u8) -> Action {
        if taps == 0 {
            return Action::No;
        }
        let idx = (taps as usize - 1).min(self.actions.len().saturating_sub(1));
        self.actions.get(idx).copied().unwrap_or(Action::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapDanceState {
    #[default]
    Idle,
    Counting {
        pos: KeyPos,
        /// Completed taps
        taps: u8,
        last_tap: Instant,
        /// Set while the key is down
        held_since: Option<Instant>,
    },
    /// The dance is resolved, waiting for the next release of the key.
    ///
    /// `action` is the layer/modifier action which is still active and released together with the key.
    Resolved { pos: KeyPos, action: Option<Action> },
}

/// Result of resolving a counting dance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDanceResolution {
    pub id: u8,
    pub pos: KeyPos,
    pub taps: u8,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapDanceRelease {
    /// A tap was counted
    Counted,
    /// The key of a resolved dance is up, release the action if any
    Finished(Option<Action>),
    /// Release without a matching press
    Ignored,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDanceTable {
    states: [TapDanceState; TAP_DANCE_MAX_NUM],
}

impl Default for TapDanceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TapDanceTable {
    pub fn new() -> Self {
        Self {
            states: [TapDanceState::Idle; TAP_DANCE_MAX_NUM],
        }
    }

    pub fn state(&self, id: u8) -> TapDanceState {
        self.states.get(id as usize).copied().unwrap_or_default()
    }

    /// Record a press of the tap dance key.
    ///
    /// Returns `false` if the press is consumed by a resolved dance whose action is still active.
    pub fn press(&mut self, id: u8, pos: KeyPos, now: Instant) -> bool {
        let Some(state) = self.states.get_mut(id as usize) else {
            return false;
        };
        match *state {
            TapDanceState::Idle => {
                *state = TapDanceState::Counting {
                    pos,
                    taps: 0,
                    last_tap: now,
                    held_since: Some(now),
                };
                true
            }
            TapDanceState::Counting { taps, last_tap, .. } => {
                *state = TapDanceState::Counting {
                    pos,
                    taps,
                    last_tap,
                    held_since: Some(now),
                };
                true
            }
            TapDanceState::Resolved { .. } => {
                debug!("Tap dance {} is resolved, press consumed", id);
                false
            }
        }
    }

    pub fn release(&mut self, id: u8, now: Instant) -> TapDanceRelease {
        let Some(state) = self.states.get_mut(id as usize) else {
            return TapDanceRelease::Ignored;
        };
        match *state {
            TapDanceState::Counting {
                pos,
                taps,
                held_since: Some(_),
                ..
            } => {
                *state = TapDanceState::Counting {
                    pos,
                    taps: taps.saturating_add(1),
                    last_tap: now,
                    held_since: None,
                };
                TapDanceRelease::Counted
            }
            TapDanceState::Resolved { action, .. } => {
                *state = TapDanceState::Idle;
                TapDanceRelease::Finished(action)
            }
            TapDanceState::Counting { held_since: None, .. } | TapDanceState::Idle => TapDanceRelease::Ignored,
        }
    }

    /// Resolve a counting dance with the completed taps, plus the current press if the key is down.
    ///
    /// A held-state action stays active until the next release of the key, any other action is tapped
    /// by the caller.
    pub fn resolve(&mut self, id: u8, dances: &[TapDance]) -> Option<TapDanceResolution> {
        let state = self.states.get_mut(id as usize)?;
        let TapDanceState::Counting {
            pos, taps, held_since, ..
        } = *state
        else {
            return None;
        };
        let key_down = held_since.is_some();
        let taps = if key_down { taps.saturating_add(1) } else { taps };
        let action = dances.get(id as usize).map_or(Action::No, |d| d.action_for(taps));

        *state = if action.is_held_state() {
            TapDanceState::Resolved {
                pos,
                action: Some(action),
            }
        } else if key_down {
            TapDanceState::Resolved { pos, action: None }
        } else {
            TapDanceState::Idle
        };
        debug!("Tap dance {} resolved with {} taps: {:?}", id, taps, action);
        Some(TapDanceResolution { id, pos, taps, action })
    }

    /// Deadline of a counting dance
    pub fn deadline(&self, id: u8, config: &TapDanceConfig) -> Option<Instant> {
        match self.state(id) {
            TapDanceState::Counting {
                held_since: Some(t), ..
            } => Some(t.checked_add(config.hold_threshold).unwrap_or(Instant::MAX)),
            TapDanceState::Counting { last_tap, .. } => {
                Some(last_tap.checked_add(config.timeout).unwrap_or(Instant::MAX))
            }
            _ => None,
        }
    }

    /// The earliest deadline among all counting dances, with its id
    pub fn next_deadline(&self, config: &TapDanceConfig) -> Option<(u8, Instant)> {
        (0..TAP_DANCE_MAX_NUM as u8)
            .filter_map(|id| self.deadline(id, config).map(|d| (id, d)))
            .min_by_key(|&(_, d)| d)
    }

    /// Counting dances of keys other than `pos`, with the time of their last activity
    pub fn counting_except(&self, pos: KeyPos) -> impl Iterator<Item = (u8, Instant)> + '_ {
        self.states.iter().enumerate().filter_map(move |(id, s)| match *s {
            TapDanceState::Counting {
                pos: p,
                last_tap,
                held_since,
                ..
            } if p != pos => Some((id as u8, held_since.unwrap_or(last_tap))),
            _ => None,
        })
    }
}
