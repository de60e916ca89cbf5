//! Keyed persistence for plugin data.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::NamedTempFile;

/// Stores structured records addressed by a class name and key.
///
/// In a host application a record usually lives as custom attribute data on a dedicated scene
/// node; the mapping is up to the implementation.
pub trait PersistenceAdapter {
    /// Read a record. A missing record is `Ok(None)`, not an error.
    fn read_by_key(&self, class_name: &str, key: &str) -> Result<Option<Value>>;
    fn write_by_key(&mut self, class_name: &str, key: &str, data: &Value) -> Result<()>;
    fn find_all_keys(&self, class_name: &str) -> Result<Vec<String>>;
    /// Remove a record, returning whether one existed.
    fn remove_by_key(&mut self, class_name: &str, key: &str) -> Result<bool>;
}

/// Volatile store, mostly useful for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn read_by_key(&self, class_name: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .records
            .get(class_name)
            .and_then(|class| class.get(key))
            .cloned())
    }

    fn write_by_key(&mut self, class_name: &str, key: &str, data: &Value) -> Result<()> {
        self.records
            .entry(class_name.to_owned())
            .or_default()
            .insert(key.to_owned(), data.clone());
        Ok(())
    }

    fn find_all_keys(&self, class_name: &str) -> Result<Vec<String>> {
        Ok(self
            .records
            .get(class_name)
            .map(|class| class.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn remove_by_key(&mut self, class_name: &str, key: &str) -> Result<bool> {
        Ok(self
            .records
            .get_mut(class_name)
            .map(|class| class.remove(key).is_some())
            .unwrap_or(false))
    }
}

/// Persists each record class as one JSON document under a store directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at the provided directory. Nothing is written until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the document backing a record class.
    pub fn class_path(&self, class_name: &str) -> PathBuf {
        self.root.join(format!("{class_name}.json"))
    }

    fn read_class(&self, class_name: &str) -> Result<BTreeMap<String, Value>> {
        let path = self.class_path(class_name);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read store file at {}", path.display()))?;
        let records = serde_json::from_str(&data)
            .with_context(|| format!("invalid store data in {}", path.display()))?;
        Ok(records)
    }

    fn write_class(&self, class_name: &str, records: &BTreeMap<String, Value>) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create store directory {}", self.root.display())
        })?;

        let path = self.class_path(class_name);
        let data = serde_json::to_string_pretty(records)
            .with_context(|| format!("failed to serialize {class_name} records"))?;

        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to stage store file in {}", self.root.display()))?;
        staged
            .write_all(data.as_bytes())
            .context("failed to write staged store file")?;
        staged
            .persist(&path)
            .with_context(|| format!("failed to write store file to {}", path.display()))?;

        tracing::debug!(class = class_name, path = %path.display(), records = records.len(), "store written");
        Ok(())
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn read_by_key(&self, class_name: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.read_class(class_name)?.remove(key))
    }

    fn write_by_key(&mut self, class_name: &str, key: &str, data: &Value) -> Result<()> {
        let mut records = self.read_class(class_name)?;
        records.insert(key.to_owned(), data.clone());
        self.write_class(class_name, &records)
    }

    fn find_all_keys(&self, class_name: &str) -> Result<Vec<String>> {
        Ok(self.read_class(class_name)?.into_keys().collect())
    }

    fn remove_by_key(&mut self, class_name: &str, key: &str) -> Result<bool> {
        let mut records = self.read_class(class_name)?;
        if records.remove(key).is_none() {
            return Ok(false);
        }
        self.write_class(class_name, &records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn memory_store_round_trips_and_removes() -> Result<()> {
        let mut store = MemoryStore::new();
        assert_eq!(store.read_by_key("Thing", "a")?, None);

        store.write_by_key("Thing", "a", &json!({"value": 1}))?;
        store.write_by_key("Other", "b", &json!(true))?;
        assert_eq!(store.read_by_key("Thing", "a")?, Some(json!({"value": 1})));
        assert_eq!(store.find_all_keys("Thing")?, vec!["a".to_string()]);

        assert!(store.remove_by_key("Thing", "a")?);
        assert!(!store.remove_by_key("Thing", "a")?);
        assert!(store.find_all_keys("Thing")?.is_empty());
        Ok(())
    }

    #[test]
    fn file_store_persists_between_instances() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("store");

        let mut store = JsonFileStore::new(&root);
        assert!(store.find_all_keys("Thing")?.is_empty());
        store.write_by_key("Thing", "first", &json!({"n": 1}))?;
        store.write_by_key("Thing", "second", &json!({"n": 2}))?;

        let reopened = JsonFileStore::new(&root);
        assert_eq!(
            reopened.find_all_keys("Thing")?,
            vec!["first".to_string(), "second".to_string()]
        );
        assert_eq!(reopened.read_by_key("Thing", "second")?, Some(json!({"n": 2})));
        assert!(reopened.class_path("Thing").exists());
        Ok(())
    }

    #[test]
    fn file_store_reports_corrupt_documents() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = JsonFileStore::new(temp.path());
        fs::write(store.class_path("Thing"), "not json")?;
        assert!(store.read_by_key("Thing", "any").is_err());
        Ok(())
    }
}
