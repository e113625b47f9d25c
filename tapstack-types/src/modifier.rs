use core::ops::{BitAnd, BitOr, Not};

use bitfield_struct::bitfield;

/// To represent all combinations of modifiers, at least 5 bits are needed.
/// 1 bit for Left/Right, 4 bits for modifier type. Represented in LSB format.
///
/// | bit4 | bit3 | bit2 | bit1 | bit0 |
/// | --- | --- | --- | --- | --- |
/// | L/R | GUI | ALT |SHIFT| CTRL|
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Eq, PartialEq)]
pub struct ModifierCombination {
    #[bits(1)]
    pub ctrl: bool,
    #[bits(1)]
    pub shift: bool,
    #[bits(1)]
    pub alt: bool,
    #[bits(1)]
    pub gui: bool,
    #[bits(1)]
    pub right: bool,
    #[bits(3)]
    _reserved: u8,
}

impl BitOr for ModifierCombination {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

impl BitAnd for ModifierCombination {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() & rhs.into_bits())
    }
}

impl Not for ModifierCombination {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Reserved bits stay cleared
        Self::from_bits(!self.into_bits() & 0b1_1111)
    }
}

impl ModifierCombination {
    pub const LCTRL: Self = Self::new().with_ctrl(true);
    pub const LSHIFT: Self = Self::new().with_shift(true);
    pub const LALT: Self = Self::new().with_alt(true);
    pub const LGUI: Self = Self::new().with_gui(true);
    pub const RCTRL: Self = Self::new().with_ctrl(true).with_right(true);
    pub const RSHIFT: Self = Self::new().with_shift(true).with_right(true);
    pub const RALT: Self = Self::new().with_alt(true).with_right(true);
    pub const RGUI: Self = Self::new().with_gui(true).with_right(true);

    pub const fn new_from(right: bool, gui: bool, alt: bool, shift: bool, ctrl: bool) -> Self {
        ModifierCombination::new()
            .with_right(right)
            .with_gui(gui)
            .with_alt(alt)
            .with_shift(shift)
            .with_ctrl(ctrl)
    }

    /// Returns `true` if no modifier is set
    pub const fn is_empty(self) -> bool {
        self.into_bits() & 0b1111 == 0
    }

    /// Get the 8-bit HID report modifier byte
    pub const fn to_hid_bits(self) -> u8 {
        let mut bits = 0u8;
        if self.ctrl() {
            bits |= 1 << 0;
        }
        if self.shift() {
            bits |= 1 << 1;
        }
        if self.alt() {
            bits |= 1 << 2;
        }
        if self.gui() {
            bits |= 1 << 3;
        }
        if self.right() { bits << 4 } else { bits }
    }
}
