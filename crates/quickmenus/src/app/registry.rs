//! Registration and build/destroy bookkeeping for marking menus.

use std::collections::BTreeMap;

use crate::app::menu::{MarkingMenu, MenuContext, MenuKind};
use crate::domain::errors::{QuickMenusError, Result};
use crate::host::MenuHost;

/// Outcome of building the menus registered under one name.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Kinds that were built and are now active.
    pub built: Vec<&'static str>,
    /// Kinds whose `should_build` declined the current context.
    pub skipped: Vec<&'static str>,
    /// Kinds that failed; the remaining kinds were still attempted.
    pub failed: Vec<(&'static str, QuickMenusError)>,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.built.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Maps menu names to the kinds built for them and tracks the active batch.
///
/// Only one batch is ever active across all names: building always tears down whatever is
/// currently shown first, because the host does not guarantee a release event before the next
/// press.
#[derive(Debug, Default)]
pub struct MenuRegistry {
    registered: BTreeMap<String, Vec<MenuKind>>,
    active: Vec<MarkingMenu>,
    build_on_show: bool,
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer item construction of every menu until the host shows it.
    pub fn with_build_on_show(mut self, build_on_show: bool) -> Self {
        self.build_on_show = build_on_show;
        self
    }

    /// Register `kind` under `name`. Registering the same kind twice is a no-op.
    pub fn register(&mut self, name: &str, kind: MenuKind) {
        let kinds = self.registered.entry(name.to_owned()).or_default();
        if kinds.contains(&kind) {
            tracing::debug!(menu = name, kind = kind.name(), "menu kind already registered");
            return;
        }
        kinds.push(kind);
        tracing::debug!(menu = name, kind = kind.name(), "menu kind registered");
    }

    /// Unregister one kind, or every kind when `all` is set.
    ///
    /// The name is dropped entirely once nothing is registered under it.
    pub fn unregister(&mut self, name: &str, kind: Option<MenuKind>, all: bool) -> Result<()> {
        if kind.is_none() && !all {
            return Err(QuickMenusError::invalid_argument(
                "a menu kind must be given when not unregistering all menus",
            ));
        }

        let Some(kinds) = self.registered.get_mut(name) else {
            return Ok(());
        };
        if all {
            kinds.clear();
        } else if let Some(kind) = kind {
            kinds.retain(|existing| *existing != kind);
        }

        if kinds.is_empty() {
            self.registered.remove(name);
            tracing::debug!(menu = name, "menu unregistered");
        }
        Ok(())
    }

    /// Kinds registered under `name`, in registration order.
    pub fn registered(&self, name: &str) -> Option<&[MenuKind]> {
        self.registered.get(name).map(Vec::as_slice)
    }

    /// Every registration, sorted by menu name.
    pub fn all_registered(&self) -> impl Iterator<Item = (&str, &[MenuKind])> {
        self.registered
            .iter()
            .map(|(name, kinds)| (name.as_str(), kinds.as_slice()))
    }

    /// Currently active instances in build order.
    pub fn active(&self) -> &[MarkingMenu] {
        &self.active
    }

    /// Destroy whatever is active, then build every kind registered under `name`.
    pub fn build(&mut self, name: &str, ctx: &mut MenuContext<'_>) -> BuildReport {
        self.destroy(&mut *ctx.host);

        let mut report = BuildReport::default();
        let Some(kinds) = self.registered.get(name).cloned() else {
            tracing::debug!(menu = name, "no menus registered, nothing to build");
            return report;
        };

        for kind in kinds {
            match self.build_one(kind, ctx) {
                Ok(true) => report.built.push(kind.name()),
                Ok(false) => report.skipped.push(kind.name()),
                Err(err) => {
                    tracing::warn!(menu = name, kind = kind.name(), error = %err, "menu failed to build");
                    report.failed.push((kind.name(), err));
                }
            }
        }

        tracing::debug!(
            menu = name,
            built = report.built.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "menus built"
        );
        report
    }

    fn build_one(&mut self, kind: MenuKind, ctx: &mut MenuContext<'_>) -> Result<bool> {
        let mut menu = MarkingMenu::instantiate(kind, self.build_on_show)?;
        if !menu.should_build(&*ctx.host) {
            return Ok(false);
        }

        if let Err(err) = menu.build(ctx) {
            if let Err(cleanup) = menu.destroy(&mut *ctx.host) {
                tracing::warn!(kind = kind.name(), error = %cleanup, "cleanup after failed build failed");
            }
            return Err(err);
        }
        self.active.push(menu);
        Ok(true)
    }

    /// Tear down every active instance in build order.
    ///
    /// Returns `true` when any of them was shown by the host; callers use this to decide whether
    /// to run a fallback action for a press that was too short to display a menu.
    pub fn destroy(&mut self, host: &mut dyn MenuHost) -> bool {
        let mut any_invoked = false;
        for mut menu in self.active.drain(..) {
            any_invoked |= menu.was_invoked();
            if let Err(err) = menu.destroy(host) {
                tracing::warn!(popup = menu.popup_id(), error = %err, "menu failed to tear down");
            }
        }
        any_invoked
    }

    /// Forward the host's will-show notification to the active menu owning `popup_id`.
    ///
    /// Returns `false` when no active menu owns that popup.
    pub fn notify_shown(&mut self, popup_id: &str, ctx: &mut MenuContext<'_>) -> Result<bool> {
        let Some(menu) = self
            .active
            .iter_mut()
            .find(|menu| menu.popup_id() == popup_id)
        else {
            tracing::debug!(popup = popup_id, "show notification for inactive popup");
            return Ok(false);
        };
        menu.on_show(ctx)?;
        Ok(true)
    }
}
