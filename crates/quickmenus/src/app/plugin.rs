//! The plugin object tying registry, collections and hotkeys together.

use crate::app::actions::{self, ActionOutcome, MenuAction};
use crate::app::hotkeys::{self, HotkeyCommand};
use crate::app::library::CollectionLibrary;
use crate::app::menu::MenuContext;
use crate::app::menus;
use crate::app::registry::{BuildReport, MenuRegistry};
use crate::domain::errors::{QuickMenusError, Result};
use crate::host::{HotkeyHost, MenuHost, PersistenceAdapter};
use crate::infra::config::{Config, MenuConfig};

/// What happened when a menu hotkey was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Whether any destroyed menu had been shown.
    pub shown: bool,
    /// Secondary host command that ran because nothing was shown.
    pub secondary: Option<String>,
}

/// Loaded plugin state. Create one on plugin load and drop it after [`QuickMenus::unload`].
#[derive(Debug)]
pub struct QuickMenus {
    config: Config,
    registry: MenuRegistry,
    library: CollectionLibrary,
    pressed: Option<String>,
}

impl QuickMenus {
    pub fn new(config: Config, store: Box<dyn PersistenceAdapter>) -> Self {
        let registry = MenuRegistry::new().with_build_on_show(config.defaults.build_on_show());
        let library = CollectionLibrary::new(store, config.defaults.default_collection().to_owned());
        Self {
            config,
            registry,
            library,
            pressed: None,
        }
    }

    pub fn registry(&self) -> &MenuRegistry {
        &self.registry
    }

    pub fn library(&mut self) -> &mut CollectionLibrary {
        &mut self.library
    }

    /// Register every configured menu group and bind its hotkey.
    pub fn load<H>(&mut self, hotkey_host: &mut H) -> Result<()>
    where
        H: HotkeyHost + ?Sized,
    {
        for menu in self.config.menus.clone() {
            self.enable(&menu)?;
            hotkeys::register_menu_hotkeys(
                hotkey_host,
                &menu.name,
                &menu.hotkey,
                menu.annotation.as_deref(),
            )?;
        }
        tracing::info!(menus = self.config.menus.len(), "quick menus loaded");
        Ok(())
    }

    /// Tear down active menus, unregister every group and remove its hotkeys.
    pub fn unload<H>(&mut self, hotkey_host: &mut H, menu_host: &mut dyn MenuHost) -> Result<()>
    where
        H: HotkeyHost + ?Sized,
    {
        self.registry.destroy(menu_host);
        self.pressed = None;
        for menu in &self.config.menus {
            self.registry.unregister(&menu.name, None, true)?;
            hotkeys::remove_menu_hotkeys(hotkey_host, &menu.name, &menu.hotkey)?;
        }
        tracing::info!("quick menus unloaded");
        Ok(())
    }

    fn enable(&mut self, menu: &MenuConfig) -> Result<()> {
        for kind_name in &menu.kinds {
            let kind = menus::kind_by_name(kind_name).ok_or_else(|| {
                QuickMenusError::invalid_argument(format!(
                    "menu '{}' uses unknown kind '{kind_name}'",
                    menu.name
                ))
            })?;
            self.registry.register(&menu.name, kind);
        }
        Ok(())
    }

    /// Hotkey press: run the pre-build command, then build the menus registered under `name`.
    ///
    /// When every registered kind failed to build, the secondary command runs right away and the
    /// following release does not run it again.
    pub fn press(&mut self, name: &str, host: &mut dyn MenuHost) -> BuildReport {
        let menu = self.config.menu(name).cloned();
        if let Some(command) = menu.as_ref().and_then(|menu| menu.pre_build.as_deref()) {
            run_host_command(host, command);
        }

        self.pressed = Some(name.to_owned());
        let report = {
            let mut ctx = MenuContext::new(host, &mut self.library);
            self.registry.build(name, &mut ctx)
        };

        if report.built.is_empty()
            && !report.failed.is_empty()
            && let Some(command) = menu.as_ref().and_then(|menu| menu.secondary.as_deref())
        {
            run_host_command(host, command);
            // The fallback already ran; release must not repeat it.
            self.pressed = None;
        }
        report
    }

    /// Hotkey release: destroy the active menus and fall back to the secondary command when none
    /// of them was ever shown.
    pub fn release(&mut self, host: &mut dyn MenuHost) -> ReleaseOutcome {
        let shown = self.registry.destroy(host);
        let pressed = self.pressed.take();
        if shown {
            return ReleaseOutcome {
                shown,
                secondary: None,
            };
        }

        let secondary = pressed
            .as_deref()
            .and_then(|name| self.config.menu(name))
            .and_then(|menu| menu.secondary.clone());
        if let Some(command) = &secondary {
            run_host_command(host, command);
        }
        ReleaseOutcome { shown, secondary }
    }

    /// The host is about to show `popup_id`.
    pub fn menu_will_show(&mut self, popup_id: &str, host: &mut dyn MenuHost) -> Result<bool> {
        let mut ctx = MenuContext::new(host, &mut self.library);
        self.registry.notify_shown(popup_id, &mut ctx)
    }

    /// An item carrying `action` was chosen.
    pub fn invoke(&mut self, action: &MenuAction, host: &mut dyn MenuHost) -> Result<ActionOutcome> {
        actions::perform(action, &mut self.library, host)
    }

    /// Route a runtime command id bound through [`hotkeys::register_menu_hotkeys`].
    pub fn run_hotkey_command(&mut self, command_id: &str, host: &mut dyn MenuHost) -> Result<()> {
        for menu in self.config.menus.clone() {
            if command_id == HotkeyCommand::build(&menu.name, None).id {
                self.press(&menu.name, host);
                return Ok(());
            }
            if command_id == HotkeyCommand::destroy(&menu.name, None).id {
                self.release(host);
                return Ok(());
            }
        }
        Err(QuickMenusError::invalid_argument(format!(
            "unknown hotkey command '{command_id}'"
        )))
    }
}

fn run_host_command(host: &mut dyn MenuHost, command: &str) {
    if let Err(err) = host.run_command(command) {
        tracing::warn!(command, error = %err, "host command failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::hotkeys::KeySpec;
    use crate::host::KeyEvent;
    use crate::host::headless::HeadlessHost;
    use crate::host::store::MemoryStore;

    fn plugin() -> QuickMenus {
        let config = Config {
            menus: vec![MenuConfig {
                name: "FMenus".into(),
                hotkey: "F".into(),
                annotation: None,
                kinds: vec!["quick-select".into()],
                pre_build: Some("setToolTo selectSuperContext".into()),
                secondary: Some("fitPanel -selectedNoChildren".into()),
            }],
            ..Config::default()
        };
        QuickMenus::new(config, Box::new(MemoryStore::new()))
    }

    #[test]
    fn load_registers_menus_and_hotkeys() {
        let mut host = HeadlessHost::new();
        let mut quick = plugin();
        quick.load(&mut host).unwrap();

        assert!(quick.registry().registered("FMenus").is_some());
        let key = KeySpec::parse("F").unwrap();
        assert_eq!(
            host.query_binding(&key, KeyEvent::Release).as_deref(),
            Some("quickMenus_destroy_FMenus")
        );

        quick.unload(&mut HeadlessHost::new(), &mut HeadlessHost::new()).unwrap();
        assert!(quick.registry().registered("FMenus").is_none());
    }

    #[test]
    fn unknown_kind_fails_to_load() {
        let mut quick = plugin();
        quick.config.menus[0].kinds.push("camera-switch".into());
        let err = quick.load(&mut HeadlessHost::new()).unwrap_err();
        assert!(matches!(err, QuickMenusError::InvalidArgument(_)));
    }

    #[test]
    fn quick_tap_runs_secondary_command() {
        let mut host = HeadlessHost::new();
        let mut quick = plugin();
        quick.load(&mut host).unwrap();

        let report = quick.press("FMenus", &mut host);
        assert_eq!(report.built, vec!["quick-select"]);
        let outcome = quick.release(&mut host);
        assert!(!outcome.shown);
        assert_eq!(
            host.commands(),
            ["setToolTo selectSuperContext", "fitPanel -selectedNoChildren"]
        );
    }

    #[test]
    fn shown_menu_skips_secondary_command() {
        let mut host = HeadlessHost::new();
        let mut quick = plugin();
        quick.load(&mut host).unwrap();

        quick.run_hotkey_command("quickMenus_build_FMenus", &mut host).unwrap();
        assert!(quick.menu_will_show("QuickMenus_QuickSelectMenu", &mut host).unwrap());
        quick.run_hotkey_command("quickMenus_destroy_FMenus", &mut host).unwrap();

        assert_eq!(host.commands(), ["setToolTo selectSuperContext"]);
        assert!(host.popup_ids().is_empty());
        assert!(quick.run_hotkey_command("quickMenus_build_Nope", &mut host).is_err());
    }

    #[test]
    fn failed_build_falls_back_immediately() {
        let mut host = HeadlessHost::new();
        host.fail_popup("QuickMenus_QuickSelectMenu");
        let mut quick = plugin();
        quick.load(&mut host).unwrap();

        let report = quick.press("FMenus", &mut host);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            host.commands().last().map(String::as_str),
            Some("fitPanel -selectedNoChildren")
        );
    }

    #[test]
    fn failed_build_runs_secondary_once_per_tap() {
        let mut host = HeadlessHost::new();
        host.fail_popup("QuickMenus_QuickSelectMenu");
        let mut quick = plugin();
        quick.config.menus[0].pre_build = None;
        quick.config.menus[0].secondary = Some("toggleIsolateSelect".into());
        quick.load(&mut host).unwrap();

        quick.press("FMenus", &mut host);
        let outcome = quick.release(&mut host);

        assert_eq!(host.commands(), ["toggleIsolateSelect"]);
        assert_eq!(
            outcome,
            ReleaseOutcome {
                shown: false,
                secondary: None,
            }
        );
    }

    #[test]
    fn invoked_actions_reach_the_library() {
        let mut host = HeadlessHost::new();
        host.select(["|pCube1"]);
        let mut quick = plugin();
        quick.load(&mut HeadlessHost::new()).unwrap();

        quick.press("FMenus", &mut host);
        let action = host
            .item_action("QuickMenus_QuickSelectMenu", "New Set From Selection")
            .unwrap();
        quick.invoke(&action, &mut host).unwrap();
        quick.release(&mut host);

        assert_eq!(quick.library().active().unwrap().len(), 1);
    }
}
