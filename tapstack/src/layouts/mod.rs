//! Ready-made keymaps.
pub mod planck;
