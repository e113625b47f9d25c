use embassy_time::Instant;
use heapless::Vec;

use crate::HELD_BUFFER_SIZE;
use crate::event::{KeyEvent, KeyPos};

/// What ends an undecided dual-role key, found in the buffered events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum BufferedDecision {
    /// The key was released before its deadline, the release is taken out of the buffer
    Released(KeyEvent),
    /// A buffered event happened after the deadline
    Timeout,
}

/// Key events which arrived while a dual-role key was undecided, in arrival order.
///
/// Used in `HoldMode::Timeout`, and for events which arrive while the effect
/// sink has no room left.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeldBuffer {
    events: Vec<KeyEvent, HELD_BUFFER_SIZE>,
}

impl HeldBuffer {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: KeyEvent) -> Result<(), KeyEvent> {
        self.events.push(event)
    }

    /// Take the oldest event
    pub fn pop(&mut self) -> Option<KeyEvent> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Index of the first event which decides the undecided key at `pos`
    fn decision_index(&self, pos: KeyPos, deadline: Instant) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.time >= deadline || (e.pos == pos && !e.pressed))
    }

    /// Scan the buffer in order for the first event which decides the undecided key at `pos`
    pub(crate) fn take_decision(&mut self, pos: KeyPos, deadline: Instant) -> Option<BufferedDecision> {
        let i = self.decision_index(pos, deadline)?;
        if self.events[i].time >= deadline {
            Some(BufferedDecision::Timeout)
        } else {
            Some(BufferedDecision::Released(self.events.remove(i)))
        }
    }

    /// When replaying can continue, `None` if the buffer waits for the undecided key.
    ///
    /// `pending` is the undecided key with its deadline. A timeout found in the
    /// buffer is left to the dual-role timer.
    pub(crate) fn replay_time(&self, pending: Option<(KeyPos, Instant)>) -> Option<Instant> {
        match pending {
            None => self.events.first().map(|e| e.time),
            Some((pos, deadline)) => self
                .decision_index(pos, deadline)
                .map(|i| self.events[i].time)
                .filter(|t| *t < deadline),
        }
    }
}
