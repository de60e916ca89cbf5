//! Hotkey parsing and press/release command wiring.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{QuickMenusError, Result};
use crate::host::{HotkeyHost, KeyEvent};

/// Runtime command category shown in the host's hotkey editor.
pub const HOTKEY_CATEGORY: &str = "Custom Scripts.quickmenus";

const COMMAND_PREFIX: &str = "quickMenus";

/// A key with its modifiers, parsed from strings such as `Alt+Shift+Q`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySpec {
    pub alt: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub command: bool,
    pub key: String,
}

impl KeySpec {
    /// Parse a `+`-delimited hotkey string. Exactly one non-modifier token is required.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parsed = KeySpec::default();
        let mut key: Option<String> = None;

        for token in spec.to_lowercase().split('+').map(str::trim) {
            match token {
                "alt" => parsed.alt = true,
                "shift" => parsed.shift = true,
                "ctrl" => parsed.ctrl = true,
                "command" => parsed.command = true,
                "" => {
                    return Err(QuickMenusError::invalid_argument(format!(
                        "invalid hotkey '{spec}': empty key token"
                    )));
                }
                other => {
                    if key.is_some() {
                        return Err(QuickMenusError::invalid_argument(format!(
                            "invalid hotkey '{spec}': more than one non-modifier key"
                        )));
                    }
                    key = Some(other.to_owned());
                }
            }
        }

        parsed.key = key.ok_or_else(|| {
            QuickMenusError::invalid_argument(format!("invalid hotkey '{spec}': no key given"))
        })?;
        Ok(parsed)
    }
}

impl FromStr for KeySpec {
    type Err = QuickMenusError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = [
            (self.ctrl, "Ctrl"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
            (self.command, "Command"),
        ];
        for (_, name) in modifiers.iter().filter(|(set, _)| *set) {
            write!(f, "{name}+")?;
        }
        f.write_str(&self.key.to_uppercase())
    }
}

/// A runtime command bound to one side of a hotkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotkeyCommand {
    pub id: String,
    pub annotation: Option<String>,
    pub category: String,
}

impl HotkeyCommand {
    pub fn build(menu_name: &str, annotation: Option<&str>) -> Self {
        Self::new("build", menu_name, annotation)
    }

    pub fn destroy(menu_name: &str, annotation: Option<&str>) -> Self {
        Self::new("destroy", menu_name, annotation)
    }

    fn new(verb: &str, menu_name: &str, annotation: Option<&str>) -> Self {
        Self {
            id: format!("{COMMAND_PREFIX}_{verb}_{menu_name}"),
            annotation: annotation.map(str::to_owned),
            category: HOTKEY_CATEGORY.to_owned(),
        }
    }
}

/// Bind `hotkey` so pressing it builds `menu_name` and releasing it destroys the active menus.
pub fn register_menu_hotkeys<H>(
    host: &mut H,
    menu_name: &str,
    hotkey: &str,
    annotation: Option<&str>,
) -> Result<KeySpec>
where
    H: HotkeyHost + ?Sized,
{
    let key = KeySpec::parse(hotkey)?;
    let press = HotkeyCommand::build(menu_name, annotation);
    let release = HotkeyCommand::destroy(menu_name, annotation);

    host.bind_press_release(&key, &press, &release)
        .map_err(QuickMenusError::Host)?;
    tracing::info!(menu = menu_name, hotkey = %key, "menu hotkeys registered");
    Ok(key)
}

/// Remove the hotkeys of `menu_name`, leaving bindings that now point elsewhere untouched.
pub fn remove_menu_hotkeys<H>(host: &mut H, menu_name: &str, hotkey: &str) -> Result<()>
where
    H: HotkeyHost + ?Sized,
{
    let key = KeySpec::parse(hotkey)?;
    let ours = [
        (KeyEvent::Press, HotkeyCommand::build(menu_name, None).id),
        (KeyEvent::Release, HotkeyCommand::destroy(menu_name, None).id),
    ];

    for (event, command_id) in ours {
        if host.query_binding(&key, event).as_deref() == Some(command_id.as_str()) {
            host.unbind(&key, event).map_err(QuickMenusError::Host)?;
        } else {
            tracing::debug!(menu = menu_name, hotkey = %key, ?event, "binding not owned, skipped");
        }
    }
    tracing::info!(menu = menu_name, hotkey = %key, "menu hotkeys removed");
    Ok(())
}
