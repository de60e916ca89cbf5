//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::{config_dir, data_dir};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));

/// Layered configuration loaded from defaults, user config, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub menus: Vec<MenuConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    pub default_collection: Option<String>,
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub build_on_show: Option<bool>,
}

impl Defaults {
    /// Collection created when the store holds none.
    pub fn default_collection(&self) -> &str {
        self.default_collection.as_deref().unwrap_or("default")
    }

    pub fn build_on_show(&self) -> bool {
        self.build_on_show.unwrap_or(false)
    }
}

/// One hotkey-triggered menu group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    pub name: String,
    pub hotkey: String,
    #[serde(default)]
    pub annotation: Option<String>,
    /// Built-in menu kinds registered under `name`.
    #[serde(default)]
    pub kinds: Vec<String>,
    /// Host command run on press, before the menus are built.
    #[serde(default)]
    pub pre_build: Option<String>,
    /// Host command run on release when no menu was shown.
    #[serde(default)]
    pub secondary: Option<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    store_dir: Option<PathBuf>,
    default_collection: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            store_dir: env::var_os("QUICKMENUS_STORE_DIR").map(PathBuf::from),
            default_collection: env::var("QUICKMENUS_DEFAULT_COLLECTION").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(store_dir: &str, default_collection: &str) -> Self {
        Self {
            store_dir: Some(PathBuf::from(store_dir)),
            default_collection: Some(default_collection.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the user config file, and env overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_layers(global_config_path(), EnvOverrides::from_env())
    }

    /// Load configuration using an explicit user config file instead of the global one.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_layers(Some(path.to_path_buf()), EnvOverrides::from_env())
    }

    fn load_with_layers(global: Option<PathBuf>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            menus: merge_menus(self.menus, other.menus),
        }
    }

    /// Directory holding the JSON collection store.
    pub fn store_dir(&self) -> PathBuf {
        self.defaults
            .store_dir
            .clone()
            .or_else(|| data_dir().map(|base| base.join("quickmenus")))
            .unwrap_or_else(|| PathBuf::from(".quickmenus"))
    }

    pub fn menu(&self, name: &str) -> Option<&MenuConfig> {
        self.menus.iter().find(|menu| menu.name == name)
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        default_collection: overlay.default_collection.or(base.default_collection),
        store_dir: overlay.store_dir.or(base.store_dir),
        build_on_show: overlay.build_on_show.or(base.build_on_show),
    }
}

/// Overlay menus replace base menus of the same name; new names are appended.
fn merge_menus(base: Vec<MenuConfig>, overlay: Vec<MenuConfig>) -> Vec<MenuConfig> {
    let mut merged = base;
    for menu in overlay {
        match merged.iter_mut().find(|existing| existing.name == menu.name) {
            Some(existing) => *existing = menu,
            None => merged.push(menu),
        }
    }
    merged
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("quickmenus/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(store_dir) = env.store_dir {
        config.defaults.store_dir = Some(store_dir);
    }
    if let Some(default_collection) = env.default_collection {
        config.defaults.default_collection = Some(default_collection);
    }
    config
}
