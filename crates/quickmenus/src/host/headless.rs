//! In-process host that records every call instead of drawing UI.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Write as _;

use anyhow::{Result, anyhow, bail};

use crate::app::actions::MenuAction;
use crate::app::hotkeys::{HotkeyCommand, KeySpec};
use crate::domain::model::NodeRef;
use crate::host::{HotkeyHost, KeyEvent, MenuHandle, MenuHost, MenuItem, PopupSpec};

#[derive(Debug, Clone)]
struct RecordedItem {
    item: MenuItem,
    children: Option<MenuHandle>,
}

/// Host double used by tests and the `simulate` command.
///
/// Dialog answers are scripted up front with [`HeadlessHost::queue_prompt`] and
/// [`HeadlessHost::queue_confirm`]; an empty queue behaves like the artist cancelling.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    panel_type: String,
    selection: Vec<String>,
    popups: BTreeMap<String, PopupSpec>,
    menus: HashMap<MenuHandle, Vec<RecordedItem>>,
    parent: Option<MenuHandle>,
    next_submenu: usize,
    failing_popups: HashSet<String>,
    prompts: VecDeque<Option<String>>,
    confirms: VecDeque<Option<String>>,
    bindings: HashMap<(KeySpec, KeyEvent), HotkeyCommand>,
    commands: Vec<String>,
    deleted: Vec<String>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            panel_type: "modelPanel".into(),
            ..Self::default()
        }
    }

    pub fn with_panel(mut self, panel_type: impl Into<String>) -> Self {
        self.panel_type = panel_type.into();
        self
    }

    pub fn set_panel(&mut self, panel_type: impl Into<String>) {
        self.panel_type = panel_type.into();
    }

    /// Replace the scene selection as if the artist had clicked objects.
    pub fn select<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = nodes.into_iter().map(Into::into).collect();
    }

    pub fn queue_prompt(&mut self, answer: Option<&str>) {
        self.prompts.push_back(answer.map(str::to_owned));
    }

    pub fn queue_confirm(&mut self, answer: Option<&str>) {
        self.confirms.push_back(answer.map(str::to_owned));
    }

    /// Make every `create_popup` call for `id` fail.
    pub fn fail_popup(&mut self, id: impl Into<String>) {
        self.failing_popups.insert(id.into());
    }

    /// Ids of the popups that currently exist.
    pub fn popup_ids(&self) -> Vec<String> {
        self.popups.keys().cloned().collect()
    }

    pub fn popup(&self, id: &str) -> Option<&PopupSpec> {
        self.popups.get(id)
    }

    /// Popup ids in the order they were deleted.
    pub fn deleted_popups(&self) -> &[String] {
        &self.deleted
    }

    /// Host commands run so far, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Labels of the items directly under a popup.
    pub fn item_labels(&self, popup_id: &str) -> Vec<String> {
        self.menus
            .get(&MenuHandle(popup_id.to_owned()))
            .map(|items| items.iter().map(|entry| entry.item.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Find an item anywhere under a popup by label, including submenus.
    pub fn find_item(&self, popup_id: &str, label: &str) -> Option<&MenuItem> {
        self.find_in(&MenuHandle(popup_id.to_owned()), label)
    }

    /// The action an item would run when clicked.
    pub fn item_action(&self, popup_id: &str, label: &str) -> Option<MenuAction> {
        self.find_item(popup_id, label)
            .and_then(|item| item.action.clone())
    }

    fn find_in(&self, handle: &MenuHandle, label: &str) -> Option<&MenuItem> {
        let items = self.menus.get(handle)?;
        items.iter().find_map(|entry| {
            if entry.item.label == label {
                Some(&entry.item)
            } else {
                entry
                    .children
                    .as_ref()
                    .and_then(|child| self.find_in(child, label))
            }
        })
    }

    /// Indented outline of every existing popup, used for snapshots and the CLI.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, spec) in &self.popups {
            let _ = writeln!(out, "popup {id} (button {})", spec.button.index());
            self.render_items(&MenuHandle(id.clone()), 1, &mut out);
        }
        out
    }

    fn render_items(&self, handle: &MenuHandle, depth: usize, out: &mut String) {
        let Some(items) = self.menus.get(handle) else {
            return;
        };
        let indent = "  ".repeat(depth);
        for entry in items {
            let item = &entry.item;
            if item.flags.divider {
                let _ = writeln!(out, "{indent}---");
                continue;
            }

            let slot = item
                .flags
                .radial
                .map(|position| format!("[{position}] "))
                .unwrap_or_default();
            let mut line = format!("{indent}{slot}{}", item.label);
            if let Some(checked) = item.flags.checked {
                line.push_str(if checked { " (x)" } else { " ( )" });
            }
            if !item.flags.enabled {
                line.push_str(" [disabled]");
            }
            if item.option_action.is_some() {
                line.push_str(" [+option]");
            }
            if item.flags.submenu {
                line.push_str(" >");
            }
            let _ = writeln!(out, "{line}");

            if let Some(children) = &entry.children {
                self.render_items(children, depth + 1, out);
            }
        }
    }

    fn current_parent(&self) -> Result<MenuHandle> {
        self.parent
            .clone()
            .ok_or_else(|| anyhow!("no parent menu set"))
    }
}

impl MenuHost for HeadlessHost {
    fn create_popup(&mut self, popup: &PopupSpec) -> Result<MenuHandle> {
        if self.failing_popups.contains(&popup.id) {
            bail!("host refused to create popup '{}'", popup.id);
        }
        if self.popups.contains_key(&popup.id) {
            bail!("popup '{}' already exists", popup.id);
        }

        let handle = MenuHandle(popup.id.clone());
        self.popups.insert(popup.id.clone(), popup.clone());
        self.menus.insert(handle.clone(), Vec::new());
        self.parent = Some(handle.clone());
        Ok(handle)
    }

    fn delete_popup(&mut self, id: &str) -> Result<()> {
        if self.popups.remove(id).is_none() {
            bail!("popup '{id}' does not exist");
        }
        self.menus.remove(&MenuHandle(id.to_owned()));
        let prefix = format!("{id}/");
        self.menus.retain(|handle, _| !handle.0.starts_with(&prefix));
        if self
            .parent
            .as_ref()
            .is_some_and(|parent| parent.0 == id || parent.0.starts_with(&prefix))
        {
            self.parent = None;
        }
        self.deleted.push(id.to_owned());
        Ok(())
    }

    fn popup_exists(&self, id: &str) -> bool {
        self.popups.contains_key(id)
    }

    fn set_parent_menu(&mut self, handle: &MenuHandle) -> Result<()> {
        if !self.menus.contains_key(handle) {
            bail!("unknown menu '{}'", handle.0);
        }
        self.parent = Some(handle.clone());
        Ok(())
    }

    fn add_menu_item(&mut self, item: MenuItem) -> Result<MenuHandle> {
        let parent = self.current_parent()?;
        let children = if item.flags.submenu {
            self.next_submenu += 1;
            let root = parent.0.split('/').next().unwrap_or(&parent.0).to_owned();
            let handle = MenuHandle(format!("{root}/submenu{}", self.next_submenu));
            self.menus.insert(handle.clone(), Vec::new());
            Some(handle)
        } else {
            None
        };

        let returned = children.clone().unwrap_or_else(|| parent.clone());
        self.menus
            .get_mut(&parent)
            .ok_or_else(|| anyhow!("unknown menu '{}'", parent.0))?
            .push(RecordedItem { item, children });
        Ok(returned)
    }

    fn delete_all_items(&mut self, handle: &MenuHandle) -> Result<()> {
        let items = self
            .menus
            .get_mut(handle)
            .ok_or_else(|| anyhow!("unknown menu '{}'", handle.0))?;
        let orphaned: Vec<MenuHandle> = items
            .drain(..)
            .filter_map(|entry| entry.children)
            .collect();
        for child in orphaned {
            self.menus.remove(&child);
        }
        Ok(())
    }

    fn confirm_dialog(&mut self, title: &str, _message: &str, buttons: &[&str]) -> Option<String> {
        let answer = self.confirms.pop_front().flatten();
        tracing::debug!(title, ?buttons, ?answer, "confirm dialog");
        answer
    }

    fn prompt_dialog(&mut self, title: &str, _message: &str, default_text: &str) -> Option<String> {
        let answer = self.prompts.pop_front().flatten();
        tracing::debug!(title, default_text, ?answer, "prompt dialog");
        answer
    }

    fn current_selection(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn set_selection(&mut self, nodes: &[NodeRef], additive: bool) -> Result<()> {
        if !additive {
            self.selection.clear();
        }
        for node in nodes {
            if !self.selection.iter().any(|existing| existing == node.as_str()) {
                self.selection.push(node.as_str().to_owned());
            }
        }
        Ok(())
    }

    fn active_panel_type(&self) -> String {
        self.panel_type.clone()
    }

    fn run_command(&mut self, command: &str) -> Result<()> {
        self.commands.push(command.to_owned());
        Ok(())
    }
}

impl HotkeyHost for HeadlessHost {
    fn bind_press_release(
        &mut self,
        key: &KeySpec,
        press: &HotkeyCommand,
        release: &HotkeyCommand,
    ) -> Result<()> {
        self.bindings
            .insert((key.clone(), KeyEvent::Press), press.clone());
        self.bindings
            .insert((key.clone(), KeyEvent::Release), release.clone());
        Ok(())
    }

    fn unbind(&mut self, key: &KeySpec, event: KeyEvent) -> Result<()> {
        self.bindings.remove(&(key.clone(), event));
        Ok(())
    }

    fn query_binding(&self, key: &KeySpec, event: KeyEvent) -> Option<String> {
        self.bindings
            .get(&(key.clone(), event))
            .map(|command| command.id.clone())
    }
}
