//! Raw key transitions fed into the keyboard.
use embassy_time::Instant;

/// Physical position of a switch in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// A single transition of a switch, stamped with the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub pos: KeyPos,
    pub pressed: bool,
    pub time: Instant,
}

impl KeyEvent {
    pub const fn new(pos: KeyPos, pressed: bool, time: Instant) -> Self {
        Self { pos, pressed, time }
    }

    /// Key press at `(row, col)`
    pub const fn press(row: u8, col: u8, time: Instant) -> Self {
        Self::new(KeyPos::new(row, col), true, time)
    }

    /// Key release at `(row, col)`
    pub const fn release(row: u8, col: u8, time: Instant) -> Self {
        Self::new(KeyPos::new(row, col), false, time)
    }
}
