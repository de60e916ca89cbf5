//! Application layer: quick select data, menu lifecycle, and hotkey wiring.

pub mod actions;
pub mod hotkeys;
pub mod library;
pub mod menu;
pub mod menus;
pub mod plugin;
pub mod quick_select;
pub mod registry;
