//! Boundary to the host application.
//!
//! Everything the plugin needs from the content-creation application goes through these traits:
//! popup menus and dialogs ([`MenuHost`]), hotkey wiring ([`HotkeyHost`]) and node-attached
//! storage ([`PersistenceAdapter`]). Implementations for a real host live outside this crate; the
//! [`headless`] and [`store`] modules provide in-process versions for tests and the CLI.

pub mod headless;
pub mod store;

use anyhow::Result;
use serde::Serialize;

use crate::app::actions::MenuAction;
use crate::app::hotkeys::{HotkeyCommand, KeySpec};
use crate::domain::model::{NodeRef, RadialPosition};

/// Mouse button that opens a popup menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Host button index (1 = left, 2 = middle, 3 = right).
    pub fn index(&self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

/// Parameters for creating a popup marking menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSpec {
    pub id: String,
    pub button: MouseButton,
    /// Let the host delete the popup on its own once dismissed.
    pub auto_delete: bool,
    /// Ask the host to call back through `menu_will_show` before displaying the popup.
    pub notify_on_show: bool,
}

/// Opaque handle to a popup or submenu created by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuHandle(pub String);

/// Item appearance and behavior flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFlags {
    pub radial: Option<RadialPosition>,
    pub enabled: bool,
    pub checked: Option<bool>,
    pub submenu: bool,
    pub divider: bool,
}

/// A single entry added to the current parent menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub flags: ItemFlags,
    /// Action run when the item is chosen.
    pub action: Option<MenuAction>,
    /// Action run from the item's option box, if any.
    pub option_action: Option<MenuAction>,
}

impl MenuItem {
    pub fn command(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            flags: ItemFlags {
                enabled: true,
                ..ItemFlags::default()
            },
            action: Some(action),
            option_action: None,
        }
    }

    pub fn submenu(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            flags: ItemFlags {
                enabled: true,
                submenu: true,
                ..ItemFlags::default()
            },
            action: None,
            option_action: None,
        }
    }

    pub fn divider() -> Self {
        Self {
            label: String::new(),
            flags: ItemFlags {
                divider: true,
                ..ItemFlags::default()
            },
            action: None,
            option_action: None,
        }
    }

    pub fn at(mut self, radial: Option<RadialPosition>) -> Self {
        self.flags.radial = radial;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.flags.enabled = enabled;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.flags.checked = Some(checked);
        self
    }

    pub fn with_option(mut self, action: MenuAction) -> Self {
        self.option_action = Some(action);
        self
    }
}

/// Popup menus, dialogs, selection and panel queries provided by the host.
pub trait MenuHost {
    fn create_popup(&mut self, popup: &PopupSpec) -> Result<MenuHandle>;
    fn delete_popup(&mut self, id: &str) -> Result<()>;
    fn popup_exists(&self, id: &str) -> bool;
    fn set_parent_menu(&mut self, handle: &MenuHandle) -> Result<()>;
    /// Add an item under the current parent. Submenu items return a handle usable as a parent.
    fn add_menu_item(&mut self, item: MenuItem) -> Result<MenuHandle>;
    fn delete_all_items(&mut self, handle: &MenuHandle) -> Result<()>;

    /// Show a modal confirmation; `None` when dismissed.
    fn confirm_dialog(&mut self, title: &str, message: &str, buttons: &[&str]) -> Option<String>;
    /// Ask for a line of text; `None` when cancelled.
    fn prompt_dialog(&mut self, title: &str, message: &str, default_text: &str) -> Option<String>;

    fn current_selection(&self) -> Vec<String>;
    fn set_selection(&mut self, nodes: &[NodeRef], additive: bool) -> Result<()>;
    fn active_panel_type(&self) -> String;

    /// Run a named host command, used for pre-build and secondary hotkey actions.
    fn run_command(&mut self, command: &str) -> Result<()>;
}

/// Key press or release side of a hotkey binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    Press,
    Release,
}

/// Hotkey registration provided by the host.
pub trait HotkeyHost {
    fn bind_press_release(
        &mut self,
        key: &KeySpec,
        press: &HotkeyCommand,
        release: &HotkeyCommand,
    ) -> Result<()>;
    fn unbind(&mut self, key: &KeySpec, event: KeyEvent) -> Result<()>;
    /// Command id currently bound to the key event, if any.
    fn query_binding(&self, key: &KeySpec, event: KeyEvent) -> Option<String>;
}

pub use store::PersistenceAdapter;
