//! Cache of quick select collections with an active-collection pointer.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::app::quick_select::{COLLECTION_CLASS, QuickSelectCollection};
use crate::domain::errors::{QuickMenusError, Result};
use crate::host::PersistenceAdapter;

/// Persistence class for plugin-wide settings.
pub const SETTINGS_CLASS: &str = "QuickMenusSettings";
const ACTIVE_COLLECTION_KEY: &str = "activeCollection";

/// Owns the persistence adapter and lazily loads collections from it.
pub struct CollectionLibrary {
    store: Box<dyn PersistenceAdapter>,
    cache: BTreeMap<String, QuickSelectCollection>,
    active: Option<String>,
    default_name: String,
}

impl std::fmt::Debug for CollectionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionLibrary")
            .field("cached", &self.cache.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("default_name", &self.default_name)
            .finish()
    }
}

impl CollectionLibrary {
    /// Wrap a store. `default_name` is the collection created when none exist yet.
    pub fn new(store: Box<dyn PersistenceAdapter>, default_name: impl Into<String>) -> Self {
        Self {
            store,
            cache: BTreeMap::new(),
            active: None,
            default_name: default_name.into(),
        }
    }

    pub fn store(&self) -> &dyn PersistenceAdapter {
        self.store.as_ref()
    }

    /// Names of every stored collection, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        QuickSelectCollection::list_names(self.store.as_ref())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.names()?.iter().any(|existing| existing == name))
    }

    /// Name of the active collection.
    ///
    /// Falls back to the persisted choice, then to the first stored collection, then to the
    /// default collection, which is created on the spot.
    pub fn active_name(&mut self) -> Result<String> {
        if let Some(active) = &self.active {
            return Ok(active.clone());
        }

        let names = self.names()?;
        let stored = self.read_active_setting()?;
        let chosen = match stored {
            Some(name) if names.contains(&name) => name,
            _ => match names.into_iter().next() {
                Some(first) => first,
                None => {
                    let name = self.default_name.clone();
                    tracing::info!(collection = %name, "creating default collection");
                    QuickSelectCollection::new(&name).save(self.store.as_mut())?;
                    name
                }
            },
        };

        self.active = Some(chosen.clone());
        Ok(chosen)
    }

    /// The active collection, loading or creating it as needed.
    pub fn active(&mut self) -> Result<&QuickSelectCollection> {
        let name = self.active_name()?;
        self.get(&name)
    }

    /// Load (or fetch from cache) a collection by name.
    pub fn get(&mut self, name: &str) -> Result<&QuickSelectCollection> {
        self.ensure_loaded(name)?;
        self.cache
            .get(name)
            .ok_or_else(|| QuickMenusError::invalid_argument(format!("unknown collection '{name}'")))
    }

    /// Run a mutation against the active collection with access to the store.
    pub fn with_active<R, F>(&mut self, edit: F) -> Result<R>
    where
        F: FnOnce(&mut QuickSelectCollection, &mut dyn PersistenceAdapter) -> Result<R>,
    {
        let name = self.active_name()?;
        self.with_collection(&name, edit)
    }

    /// Run a mutation against a named collection with access to the store.
    pub fn with_collection<R, F>(&mut self, name: &str, edit: F) -> Result<R>
    where
        F: FnOnce(&mut QuickSelectCollection, &mut dyn PersistenceAdapter) -> Result<R>,
    {
        self.ensure_loaded(name)?;
        let collection = self
            .cache
            .get_mut(name)
            .ok_or_else(|| QuickMenusError::invalid_argument(format!("unknown collection '{name}'")))?;
        edit(collection, self.store.as_mut())
    }

    /// Make `name` the active collection, creating it if it was never stored.
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        if !self.contains(name)? {
            self.create(name)?;
        }
        self.write_active_setting(name)?;
        self.active = Some(name.to_owned());
        tracing::info!(collection = name, "active collection changed");
        Ok(())
    }

    /// Create and persist an empty collection. An existing collection with that name is kept.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        if self.contains(name)? {
            tracing::debug!(collection = name, "collection already exists");
            return Ok(());
        }
        let collection = QuickSelectCollection::new(name);
        collection.save(self.store.as_mut())?;
        self.cache.insert(name.to_owned(), collection);
        tracing::info!(collection = name, "collection created");
        Ok(())
    }

    /// Rename a collection. Name collisions are not checked; the renamed collection wins.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let new = validate_name(new)?;
        if !self.contains(old)? {
            return Err(QuickMenusError::invalid_argument(format!(
                "unknown collection '{old}'"
            )));
        }
        let was_active = match &self.active {
            Some(active) => active == old,
            None => self.read_active_setting()?.as_deref() == Some(old),
        };
        self.ensure_loaded(old)?;
        let mut collection = self
            .cache
            .remove(old)
            .ok_or_else(|| QuickMenusError::invalid_argument(format!("unknown collection '{old}'")))?;

        if let Err(err) = collection.rename(new, self.store.as_mut()) {
            self.cache.insert(old.to_owned(), collection);
            return Err(err);
        }
        self.cache.insert(new.to_owned(), collection);

        if was_active {
            self.write_active_setting(new)?;
            self.active = Some(new.to_owned());
        }
        Ok(())
    }

    /// Delete a collection and its record. Deleting the active one clears the active pointer.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        self.cache.remove(name);
        let removed = self
            .store
            .remove_by_key(COLLECTION_CLASS, &QuickSelectCollection::storage_key(name))
            .map_err(QuickMenusError::Persistence)?;
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        if removed {
            tracing::info!(collection = name, "collection deleted");
        }
        Ok(removed)
    }

    fn ensure_loaded(&mut self, name: &str) -> Result<()> {
        if !self.cache.contains_key(name) {
            let loaded = QuickSelectCollection::load(name, self.store.as_ref())?;
            self.cache.insert(name.to_owned(), loaded);
        }
        Ok(())
    }

    fn read_active_setting(&self) -> Result<Option<String>> {
        let value = self
            .store
            .read_by_key(SETTINGS_CLASS, ACTIVE_COLLECTION_KEY)
            .map_err(QuickMenusError::Persistence)?;
        Ok(value.and_then(|value| value.as_str().map(str::to_owned)))
    }

    fn write_active_setting(&mut self, name: &str) -> Result<()> {
        self.store
            .write_by_key(
                SETTINGS_CLASS,
                ACTIVE_COLLECTION_KEY,
                &Value::String(name.to_owned()),
            )
            .map_err(QuickMenusError::Persistence)
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(QuickMenusError::invalid_argument(
            "collection name cannot be empty",
        ));
    }
    Ok(trimmed)
}
