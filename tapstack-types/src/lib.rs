//! # tapstack types
//!
//! Fundamental type definitions shared by the tapstack resolver and by the
//! code that builds keymaps for it.
//!
//! ## Modules
//!
//! - [`action`] - What a key position does: basic [`action::Action`]s and keymap cells ([`action::KeyAction`])
//! - [`keycode`] - HID keyboard usage ids
//! - [`modifier`] - Modifier key combinations

#![no_std]

pub mod action;
pub mod keycode;
pub mod modifier;
