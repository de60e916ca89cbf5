//! Marking menu lifecycle shared by every menu kind.

use std::fmt;

use crate::app::library::CollectionLibrary;
use crate::domain::errors::{QuickMenusError, Result};
use crate::host::{MenuHandle, MenuHost, MouseButton, PopupSpec};

/// Everything a menu needs while building its items.
pub struct MenuContext<'a> {
    pub host: &'a mut dyn MenuHost,
    pub library: &'a mut CollectionLibrary,
}

impl<'a> MenuContext<'a> {
    pub fn new(host: &'a mut dyn MenuHost, library: &'a mut CollectionLibrary) -> Self {
        Self { host, library }
    }
}

/// Behavior specific to one kind of marking menu.
pub trait MenuDefinition {
    /// Host identity of the popup; must not be empty.
    fn popup_id(&self) -> &str;

    fn mouse_button(&self) -> MouseButton {
        MouseButton::Left
    }

    /// Defer item construction until the host is about to show the menu.
    fn build_on_show(&self) -> bool {
        false
    }

    /// Whether the menu applies to the current host context.
    fn should_build(&self, _host: &dyn MenuHost) -> bool {
        true
    }

    /// Add items under `root`, which is the current parent menu when this is called.
    fn build_items(&mut self, ctx: &mut MenuContext<'_>, root: &MenuHandle) -> Result<()>;
}

/// A constructible menu kind, registered by name.
#[derive(Clone, Copy)]
pub struct MenuKind {
    name: &'static str,
    create: fn() -> Box<dyn MenuDefinition>,
}

impl MenuKind {
    pub const fn new(name: &'static str, create: fn() -> Box<dyn MenuDefinition>) -> Self {
        Self { name, create }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Box<dyn MenuDefinition> {
        (self.create)()
    }
}

impl PartialEq for MenuKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MenuKind {}

impl fmt::Debug for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MenuKind").field(&self.name).finish()
    }
}

/// A built (or about to be built) instance of a menu kind.
pub struct MarkingMenu {
    kind: MenuKind,
    definition: Box<dyn MenuDefinition>,
    build_on_show: bool,
    root: Option<MenuHandle>,
    was_invoked: bool,
}

impl fmt::Debug for MarkingMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkingMenu")
            .field("kind", &self.kind)
            .field("popup_id", &self.definition.popup_id())
            .field("build_on_show", &self.build_on_show)
            .field("was_invoked", &self.was_invoked)
            .finish()
    }
}

impl MarkingMenu {
    /// Create an instance of `kind`. `build_on_show` forces deferred item construction.
    pub fn instantiate(kind: MenuKind, build_on_show: bool) -> Result<Self> {
        let definition = kind.instantiate();
        if definition.popup_id().trim().is_empty() {
            return Err(QuickMenusError::MissingContract(kind.name().to_owned()));
        }
        let build_on_show = build_on_show || definition.build_on_show();
        Ok(Self {
            kind,
            definition,
            build_on_show,
            root: None,
            was_invoked: false,
        })
    }

    pub fn popup_id(&self) -> &str {
        self.definition.popup_id()
    }

    /// Whether the host ever displayed this menu.
    pub fn was_invoked(&self) -> bool {
        self.was_invoked
    }

    pub fn should_build(&self, host: &dyn MenuHost) -> bool {
        self.definition.should_build(host)
    }

    /// Create the popup, replacing any leftover popup with the same id.
    pub fn build(&mut self, ctx: &mut MenuContext<'_>) -> Result<()> {
        let id = self.definition.popup_id().to_owned();
        if ctx.host.popup_exists(&id) {
            tracing::debug!(popup = %id, "removing stale popup before build");
            ctx.host.delete_popup(&id).map_err(QuickMenusError::Host)?;
        }

        let spec = PopupSpec {
            id,
            button: self.definition.mouse_button(),
            auto_delete: false,
            notify_on_show: true,
        };
        let root = ctx.host.create_popup(&spec).map_err(QuickMenusError::Host)?;
        self.root = Some(root.clone());

        if !self.build_on_show {
            self.definition.build_items(ctx, &root)?;
        }
        Ok(())
    }

    /// Called when the host is about to display the popup.
    pub fn on_show(&mut self, ctx: &mut MenuContext<'_>) -> Result<()> {
        self.was_invoked = true;
        if !self.build_on_show {
            return Ok(());
        }
        let Some(root) = self.root.clone() else {
            return Ok(());
        };

        ctx.host
            .delete_all_items(&root)
            .map_err(QuickMenusError::Host)?;
        ctx.host
            .set_parent_menu(&root)
            .map_err(QuickMenusError::Host)?;
        self.definition.build_items(ctx, &root)
    }

    /// Delete the popup if it still exists.
    pub fn destroy(&mut self, host: &mut dyn MenuHost) -> Result<()> {
        self.root = None;
        let id = self.definition.popup_id();
        if host.popup_exists(id) {
            host.delete_popup(id).map_err(QuickMenusError::Host)?;
        }
        Ok(())
    }
}
