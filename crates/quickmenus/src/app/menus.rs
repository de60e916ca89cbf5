//! Built-in marking menus for quick select sets.

use crate::app::actions::MenuAction;
use crate::app::menu::{MenuContext, MenuDefinition, MenuKind};
use crate::domain::errors::{QuickMenusError, Result};
use crate::domain::layout::{MAX_MENU_ITEMS, first_free_position, radial_positions};
use crate::host::{MenuHandle, MenuHost, MenuItem, MouseButton};

/// Sets of the active collection on radial slots, plus editing commands.
pub const QUICK_SELECT: MenuKind = MenuKind::new("quick-select", quick_select);
/// Switch between collections and manage them.
pub const QUICK_SELECT_COLLECTIONS: MenuKind =
    MenuKind::new("quick-select-collections", quick_select_collections);

const BUILTIN: [MenuKind; 2] = [QUICK_SELECT, QUICK_SELECT_COLLECTIONS];

/// Look up a built-in menu kind by its registered name.
pub fn kind_by_name(name: &str) -> Option<MenuKind> {
    BUILTIN.into_iter().find(|kind| kind.name() == name)
}

pub fn builtin_kinds() -> &'static [MenuKind] {
    &BUILTIN
}

fn quick_select() -> Box<dyn MenuDefinition> {
    Box::new(QuickSelectMenu)
}

fn quick_select_collections() -> Box<dyn MenuDefinition> {
    Box::new(QuickSelectCollectionsMenu)
}

fn add(ctx: &mut MenuContext<'_>, item: MenuItem) -> Result<MenuHandle> {
    ctx.host.add_menu_item(item).map_err(QuickMenusError::Host)
}

fn set_parent(ctx: &mut MenuContext<'_>, handle: &MenuHandle) -> Result<()> {
    ctx.host
        .set_parent_menu(handle)
        .map_err(QuickMenusError::Host)
}

/// Left-button menu shown in model panels.
#[derive(Debug, Default)]
pub struct QuickSelectMenu;

impl MenuDefinition for QuickSelectMenu {
    fn popup_id(&self) -> &str {
        "QuickMenus_QuickSelectMenu"
    }

    fn mouse_button(&self) -> MouseButton {
        MouseButton::Left
    }

    fn should_build(&self, host: &dyn MenuHost) -> bool {
        host.active_panel_type() == "modelPanel"
    }

    fn build_items(&mut self, ctx: &mut MenuContext<'_>, root: &MenuHandle) -> Result<()> {
        let collection = ctx.library.active()?.clone();
        let has_selection = !ctx.host.current_selection().is_empty();

        for (index, set) in collection.sets().iter().enumerate() {
            let item = MenuItem::command(
                set.effective_title(),
                MenuAction::SelectSet {
                    index,
                    additive: false,
                },
            )
            .at(set.position())
            .with_option(MenuAction::SelectSet {
                index,
                additive: true,
            });
            add(ctx, item)?;
        }

        if !collection.is_empty() {
            add(ctx, MenuItem::divider())?;
        }

        let free = first_free_position(collection.used_positions());
        add(
            ctx,
            MenuItem::command(
                "New Set From Selection",
                MenuAction::SaveSelectionAsSet { position: free },
            )
            .enabled(has_selection && free.is_some()),
        )?;

        if !collection.is_empty() {
            let edit = add(ctx, MenuItem::submenu("Edit Sets"))?;
            for (index, set) in collection.sets().iter().enumerate() {
                set_parent(ctx, &edit)?;
                let entry = add(ctx, MenuItem::submenu(set.effective_title()))?;
                set_parent(ctx, &entry)?;
                add(
                    ctx,
                    MenuItem::command(
                        "Add Selection",
                        MenuAction::AddSelectionToSet { index },
                    )
                    .enabled(has_selection),
                )?;
                add(
                    ctx,
                    MenuItem::command(
                        "Replace With Selection",
                        MenuAction::ReplaceSetWithSelection { index },
                    )
                    .enabled(has_selection),
                )?;
                add(
                    ctx,
                    MenuItem::command("Rename...", MenuAction::RenameSet { index }),
                )?;
                add(
                    ctx,
                    MenuItem::command("Remove", MenuAction::RemoveSet { index }),
                )?;
            }
            set_parent(ctx, root)?;
            add(
                ctx,
                MenuItem::command("Clear Collection...", MenuAction::ClearCollection),
            )?;
        }
        Ok(())
    }
}

/// Right-button menu listing every collection.
#[derive(Debug, Default)]
pub struct QuickSelectCollectionsMenu;

impl MenuDefinition for QuickSelectCollectionsMenu {
    fn popup_id(&self) -> &str {
        "QuickMenus_QuickSelectCollectionsMenu"
    }

    fn mouse_button(&self) -> MouseButton {
        MouseButton::Right
    }

    fn build_items(&mut self, ctx: &mut MenuContext<'_>, _root: &MenuHandle) -> Result<()> {
        let active = ctx.library.active_name()?;
        let names = ctx.library.names()?;
        if names.len() as i64 > MAX_MENU_ITEMS {
            tracing::warn!(collections = names.len(), "too many collections, listing the first {MAX_MENU_ITEMS}");
        }
        let positions = radial_positions((names.len() as i64).min(MAX_MENU_ITEMS))?;

        for (name, position) in names.iter().zip(positions) {
            add(
                ctx,
                MenuItem::command(
                    name.clone(),
                    MenuAction::SwitchCollection { name: name.clone() },
                )
                .at(position)
                .checked(*name == active),
            )?;
        }

        add(ctx, MenuItem::divider())?;
        add(
            ctx,
            MenuItem::command("New Collection...", MenuAction::NewCollection),
        )?;
        add(
            ctx,
            MenuItem::command("Rename Collection...", MenuAction::RenameCollection),
        )?;
        add(
            ctx,
            MenuItem::command("Delete Collection...", MenuAction::DeleteCollection),
        )?;
        Ok(())
    }
}
