//! Build-time behavior configuration.
use embassy_time::Duration;
use heapless::Vec;

use crate::TAP_DANCE_MAX_NUM;
use crate::tap_dance::TapDance;
use crate::tri_layer::TriLayer;

/// Tunable behavior of the keyboard.
///
/// Defaults follow QMK: 200ms tapping term, 200ms tap dance term and 1s one-shot timeout.
#[derive(Clone, Debug, Default)]
pub struct BehaviorConfig {
    /// Layer used as base when nothing valid is persisted
    pub default_layer: u8,
    pub tri_layer: Option<TriLayer>,
    pub tap_hold: TapHoldConfig,
    pub tap_dance: TapDanceConfig,
    pub one_shot: OneShotConfig,
}

/// How an undecided dual-role key is turned into a hold.
///
/// One mode applies to every dual-role key of a keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldMode {
    /// Pressing any other key while the dual-role key is undecided selects hold.
    /// The timeout selects hold as well.
    #[default]
    HoldOnOtherPress,
    /// Only the timeout selects hold.
    ///
    /// Keys pressed while the dual-role key is undecided are buffered and
    /// replayed, in order, once the decision is made.
    Timeout,
}

/// Configurations for tap hold behavior
#[derive(Clone, Copy, Debug)]
pub struct TapHoldConfig {
    /// Time after which an undecided dual-role key becomes a hold
    pub timeout: Duration,
    pub mode: HoldMode,
}

impl Default for TapHoldConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            mode: HoldMode::HoldOnOtherPress,
        }
    }
}

/// Config for tap dance behavior
#[derive(Clone, Debug)]
pub struct TapDanceConfig {
    /// Maximum time between a release and the next tap
    pub timeout: Duration,
    /// Holding the key longer than this resolves the dance while the key is down
    pub hold_threshold: Duration,
    /// Tap dance definitions, indexed by the id used in `KeyAction::TapDance`
    pub tap_dances: Vec<TapDance, TAP_DANCE_MAX_NUM>,
}

impl Default for TapDanceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            hold_threshold: Duration::from_millis(200),
            tap_dances: Vec::new(),
        }
    }
}

/// Config for one shot behavior
#[derive(Clone, Copy, Debug)]
pub struct OneShotConfig {
    pub timeout: Duration,
}

impl Default for OneShotConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}
