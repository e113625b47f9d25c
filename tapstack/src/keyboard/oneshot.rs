use embassy_time::{Duration, Instant};

use crate::event::KeyPos;

/// The one-shot layer which waits for the next key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneShotLayer {
    pub layer: u8,
    /// Position of the key which activated the layer
    pub pos: KeyPos,
    pub since: Instant,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotState {
    /// Waiting for a key press at another position, or the timeout
    Active(OneShotLayer),
    /// One shot inactive
    #[default]
    None,
}

impl OneShotState {
    pub fn active(&self) -> Option<OneShotLayer> {
        match self {
            OneShotState::Active(l) => Some(*l),
            OneShotState::None => None,
        }
    }

    pub fn start(&mut self, layer: u8, pos: KeyPos, now: Instant) {
        *self = OneShotState::Active(OneShotLayer { layer, pos, since: now });
    }

    pub fn take(&mut self) -> Option<OneShotLayer> {
        let active = self.active();
        *self = OneShotState::None;
        active
    }

    pub fn deadline(&self, timeout: Duration) -> Option<Instant> {
        self.active()
            .map(|l| l.since.checked_add(timeout).unwrap_or(Instant::MAX))
    }
}
