//! Quick select sets and the collections that persist them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::errors::{QuickMenusError, Result};
use crate::domain::model::{NodeRef, RadialPosition};
use crate::host::{MenuHost, PersistenceAdapter};

/// Persistence class holding every collection record.
pub const COLLECTION_CLASS: &str = "QuickSelectCollection";
/// Prefix turning a collection name into its storage key.
pub const COLLECTION_KEY_PREFIX: &str = "quickSelectCollection_";
/// Longest derived title shown before it gets abbreviated.
pub const TITLE_MAX_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

/// A saved group of scene nodes, optionally pinned to a radial slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickSelectSet {
    nodes: Vec<NodeRef>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    position: Option<RadialPosition>,
}

impl QuickSelectSet {
    /// Create a set from raw node references, normalizing each one.
    pub fn new<I, S>(nodes: I, title: Option<String>, position: Option<RadialPosition>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            nodes: Vec::new(),
            title: None,
            position,
        };
        set.add_nodes(nodes)?;
        set.rename(title);
        Ok(set)
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn position(&self) -> Option<RadialPosition> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<RadialPosition>) {
        self.position = position;
    }

    /// The explicit title, or the node short names abbreviated to fit a menu item.
    pub fn effective_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        if self.nodes.is_empty() {
            return "(empty)".into();
        }

        let joined = self
            .nodes
            .iter()
            .map(NodeRef::short_name)
            .collect::<Vec<_>>()
            .join(", ");
        if joined.chars().count() <= TITLE_MAX_CHARS {
            return joined;
        }

        let keep = TITLE_MAX_CHARS - ELLIPSIS.len();
        let mut abbreviated: String = joined.chars().take(keep).collect();
        abbreviated.push_str(ELLIPSIS);
        abbreviated
    }

    /// Union new nodes into the set. Existing entries keep their order and are never duplicated.
    pub fn add_nodes<I, S>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let incoming = NodeRef::parse_all(nodes)?;
        for node in incoming {
            if !self.nodes.contains(&node) {
                self.nodes.push(node);
            }
        }
        Ok(())
    }

    /// Discard current nodes and take the given ones instead.
    pub fn replace_nodes<I, S>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let incoming = NodeRef::parse_all(nodes)?;
        self.nodes.clear();
        for node in incoming {
            if !self.nodes.contains(&node) {
                self.nodes.push(node);
            }
        }
        Ok(())
    }

    /// Set or clear the explicit title. Blank titles count as no title.
    pub fn rename(&mut self, title: Option<String>) {
        self.title = title
            .map(|title| title.trim().to_owned())
            .filter(|title| !title.is_empty());
    }

    /// Select this set's nodes in the host, replacing or extending the current selection.
    pub fn select<H>(&self, host: &mut H, additive: bool) -> Result<()>
    where
        H: MenuHost + ?Sized,
    {
        host.set_selection(&self.nodes, additive)
            .map_err(QuickMenusError::Host)
    }
}

/// Stored form of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionRecord {
    name: String,
    #[serde(default)]
    sets: Vec<QuickSelectSet>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// A named, ordered group of quick select sets persisted as one record.
///
/// Every mutator writes the new state through the [`PersistenceAdapter`] before committing it in
/// memory, so a failed write leaves the collection as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickSelectCollection {
    name: String,
    sets: Vec<QuickSelectSet>,
}

impl QuickSelectCollection {
    /// An empty, unsaved collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sets(&self) -> &[QuickSelectSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuickSelectSet> {
        self.sets.get(index)
    }

    /// Set occupying the given radial slot.
    pub fn at_position(&self, position: RadialPosition) -> Option<&QuickSelectSet> {
        self.sets
            .iter()
            .find(|set| set.position == Some(position))
    }

    /// Radial slots already taken by a set.
    pub fn used_positions(&self) -> Vec<RadialPosition> {
        self.sets.iter().filter_map(|set| set.position).collect()
    }

    /// Storage key for a collection name.
    pub fn storage_key(name: &str) -> String {
        format!("{COLLECTION_KEY_PREFIX}{name}")
    }

    /// Names of every persisted collection, sorted.
    pub fn list_names<P>(store: &P) -> Result<Vec<String>>
    where
        P: PersistenceAdapter + ?Sized,
    {
        let mut names: Vec<String> = store
            .find_all_keys(COLLECTION_CLASS)
            .map_err(QuickMenusError::Persistence)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(COLLECTION_KEY_PREFIX).map(str::to_owned))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a collection by name. A missing record yields an empty collection with that name.
    ///
    /// A record holding several sets on one slot keeps the first; the later ones lose their slot.
    pub fn load<P>(name: &str, store: &P) -> Result<Self>
    where
        P: PersistenceAdapter + ?Sized,
    {
        let key = Self::storage_key(name);
        let Some(data) = store
            .read_by_key(COLLECTION_CLASS, &key)
            .map_err(QuickMenusError::Persistence)?
        else {
            tracing::debug!(collection = name, "no stored collection, starting empty");
            return Ok(Self::new(name));
        };

        let record: CollectionRecord = serde_json::from_value(data).map_err(|err| {
            QuickMenusError::Persistence(
                anyhow::Error::new(err).context(format!("invalid record for collection '{name}'")),
            )
        })?;
        let mut sets = record.sets;
        let mut used = Vec::new();
        for set in &mut sets {
            let Some(position) = set.position else {
                continue;
            };
            if used.contains(&position) {
                tracing::warn!(collection = name, %position, "stored set shares a slot, moved to overflow");
                set.position = None;
            } else {
                used.push(position);
            }
        }
        Ok(Self {
            name: name.to_owned(),
            sets,
        })
    }

    /// Write the collection under its current name.
    pub fn save<P>(&self, store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        Self::write(&self.name, &self.sets, store)
    }

    /// Append a set. Fails without touching the collection when its slot is taken.
    pub fn add_set<P>(&mut self, set: QuickSelectSet, store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        if let Some(position) = set.position
            && self.at_position(position).is_some()
        {
            return Err(QuickMenusError::PositionConflict(position));
        }

        let mut sets = self.sets.clone();
        sets.push(set);
        self.commit(sets, store)
    }

    /// Remove the first set on `position`. Returns `false` when no set uses that slot.
    pub fn remove_at_position<P>(&mut self, position: RadialPosition, store: &mut P) -> Result<bool>
    where
        P: PersistenceAdapter + ?Sized,
    {
        let Some(index) = self
            .sets
            .iter()
            .position(|set| set.position == Some(position))
        else {
            return Ok(false);
        };

        let mut sets = self.sets.clone();
        sets.remove(index);
        self.commit(sets, store)?;
        Ok(true)
    }

    /// Remove the set at `index`, returning it.
    pub fn remove_at_index<P>(&mut self, index: usize, store: &mut P) -> Result<QuickSelectSet>
    where
        P: PersistenceAdapter + ?Sized,
    {
        self.check_index(index)?;
        let mut sets = self.sets.clone();
        let removed = sets.remove(index);
        self.commit(sets, store)?;
        Ok(removed)
    }

    pub fn clear<P>(&mut self, store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        self.commit(Vec::new(), store)
    }

    /// Apply an edit to one set and persist it.
    ///
    /// The edit works on a copy; it only lands when it succeeds, keeps slots unique and the write
    /// goes through.
    pub fn modify_set<P, F>(&mut self, index: usize, store: &mut P, edit: F) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
        F: FnOnce(&mut QuickSelectSet) -> Result<()>,
    {
        self.check_index(index)?;
        let mut edited = self.sets[index].clone();
        edit(&mut edited)?;

        if let Some(position) = edited.position {
            let taken = self
                .sets
                .iter()
                .enumerate()
                .any(|(other, set)| other != index && set.position == Some(position));
            if taken {
                return Err(QuickMenusError::PositionConflict(position));
            }
        }

        let mut sets = self.sets.clone();
        sets[index] = edited;
        self.commit(sets, store)
    }

    /// Rename the collection and move its record to the new key.
    ///
    /// Another collection already stored under `new_name` is overwritten.
    pub fn rename<P>(&mut self, new_name: &str, store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(QuickMenusError::invalid_argument(
                "collection name cannot be empty",
            ));
        }
        if new_name == self.name {
            return Ok(());
        }

        let existing = Self::list_names(store)?;
        if existing.iter().any(|name| name == new_name) {
            tracing::warn!(from = %self.name, to = new_name, "rename overwrites an existing collection");
        }

        Self::write(new_name, &self.sets, store)?;
        store
            .remove_by_key(COLLECTION_CLASS, &Self::storage_key(&self.name))
            .map_err(QuickMenusError::Persistence)?;
        tracing::info!(from = %self.name, to = new_name, "collection renamed");
        self.name = new_name.to_owned();
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.sets.len() {
            return Err(QuickMenusError::IndexOutOfRange {
                index,
                len: self.sets.len(),
            });
        }
        Ok(())
    }

    fn commit<P>(&mut self, sets: Vec<QuickSelectSet>, store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        Self::write(&self.name, &sets, store)?;
        self.sets = sets;
        Ok(())
    }

    fn write<P>(name: &str, sets: &[QuickSelectSet], store: &mut P) -> Result<()>
    where
        P: PersistenceAdapter + ?Sized,
    {
        let record = CollectionRecord {
            name: name.to_owned(),
            sets: sets.to_vec(),
            updated_at: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
        };
        let data: Value = serde_json::to_value(&record)
            .map_err(|err| QuickMenusError::Persistence(err.into()))?;
        store
            .write_by_key(COLLECTION_CLASS, &Self::storage_key(name), &data)
            .map_err(QuickMenusError::Persistence)?;
        tracing::debug!(collection = name, sets = sets.len(), "collection saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::bail;

    use crate::host::headless::HeadlessHost;
    use crate::host::store::MemoryStore;

    use RadialPosition::{E, N, S, W};

    fn set(nodes: &[&str], position: Option<RadialPosition>) -> QuickSelectSet {
        QuickSelectSet::new(nodes.iter().copied(), None, position).expect("valid set")
    }

    fn tuples(collection: &QuickSelectCollection) -> Vec<(Vec<NodeRef>, Option<String>, Option<RadialPosition>)> {
        collection
            .sets()
            .iter()
            .map(|set| {
                (
                    set.nodes().to_vec(),
                    set.title().map(str::to_owned),
                    set.position(),
                )
            })
            .collect()
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: bool,
    }

    impl PersistenceAdapter for FlakyStore {
        fn read_by_key(&self, class_name: &str, key: &str) -> anyhow::Result<Option<Value>> {
            self.inner.read_by_key(class_name, key)
        }

        fn write_by_key(&mut self, class_name: &str, key: &str, data: &Value) -> anyhow::Result<()> {
            if self.fail_writes {
                bail!("disk full");
            }
            self.inner.write_by_key(class_name, key, data)
        }

        fn find_all_keys(&self, class_name: &str) -> anyhow::Result<Vec<String>> {
            self.inner.find_all_keys(class_name)
        }

        fn remove_by_key(&mut self, class_name: &str, key: &str) -> anyhow::Result<bool> {
            self.inner.remove_by_key(class_name, key)
        }
    }

    #[test]
    fn new_set_normalizes_and_rejects_bad_references() {
        let created = set(&["pCube1", "|group1|pSphere1|"], Some(N));
        assert_eq!(
            created.nodes().iter().map(NodeRef::as_str).collect::<Vec<_>>(),
            vec!["|pCube1", "|group1|pSphere1"]
        );

        let err = QuickSelectSet::new(["|ok", "bad node"], None, None).unwrap_err();
        assert!(matches!(err, QuickMenusError::InvalidReference(raw) if raw == "bad node"));
    }

    #[test]
    fn effective_title_prefers_explicit_title() {
        let mut titled = set(&["|a|pCube1"], None);
        assert_eq!(titled.effective_title(), "pCube1");

        titled.rename(Some("  Hero rig  ".into()));
        assert_eq!(titled.effective_title(), "Hero rig");

        titled.rename(Some("   ".into()));
        assert_eq!(titled.title(), None);
    }

    #[test]
    fn effective_title_abbreviates_long_names() {
        let long = set(&["|pCube1", "|pSphere1", "|pCylinder1", "|pTorus1"], None);
        let title = long.effective_title();
        assert_eq!(title, "pCube1, pSphere1, pCylinder...");
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);

        let empty = QuickSelectSet::new(Vec::<String>::new(), None, None).unwrap();
        assert_eq!(empty.effective_title(), "(empty)");
    }

    #[test]
    fn add_nodes_unions_and_replace_nodes_discards() {
        let mut quick = set(&["|a", "|b"], None);
        quick.add_nodes(["b", "|c", "|a"]).unwrap();
        assert_eq!(
            quick.nodes().iter().map(NodeRef::as_str).collect::<Vec<_>>(),
            vec!["|a", "|b", "|c"]
        );

        quick.replace_nodes(["|z"]).unwrap();
        assert_eq!(quick.nodes().len(), 1);
        assert_eq!(quick.nodes()[0].as_str(), "|z");

        assert!(quick.add_nodes(["a||b"]).is_err());
        assert_eq!(quick.nodes().len(), 1);
    }

    #[test]
    fn select_delegates_to_host() {
        let mut host = HeadlessHost::new();
        host.select(["|other"]);
        let quick = set(&["|a", "|b"], None);

        quick.select(&mut host, true).unwrap();
        assert_eq!(host.current_selection(), vec!["|other", "|a", "|b"]);

        quick.select(&mut host, false).unwrap();
        assert_eq!(host.current_selection(), vec!["|a", "|b"]);
    }

    #[test]
    fn load_missing_collection_is_empty() {
        let store = MemoryStore::new();
        let loaded = QuickSelectCollection::load("nothing", &store).unwrap();
        assert_eq!(loaded.name(), "nothing");
        assert!(loaded.is_empty());
    }

    #[test]
    fn load_moves_duplicate_slots_to_overflow() {
        let mut store = MemoryStore::new();
        let record = serde_json::json!({
            "name": "rig",
            "sets": [
                {"nodes": ["|a"], "position": "N"},
                {"nodes": ["|b"], "position": "N"},
                {"nodes": ["|c"], "position": "S"},
            ],
        });
        store
            .write_by_key(COLLECTION_CLASS, &QuickSelectCollection::storage_key("rig"), &record)
            .unwrap();

        let mut loaded = QuickSelectCollection::load("rig", &store).unwrap();
        assert_eq!(loaded.used_positions(), vec![N, S]);
        assert_eq!(loaded.at_position(N).unwrap().nodes()[0].as_str(), "|a");
        assert_eq!(loaded.get(1).unwrap().position(), None);

        loaded
            .modify_set(1, &mut store, |set| set.add_nodes(["|d"]))
            .unwrap();
        assert_eq!(loaded.get(1).unwrap().nodes().len(), 2);
    }

    #[test]
    fn mutations_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let mut collection = QuickSelectCollection::new("rig");

        collection.add_set(set(&["|a"], Some(N)), &mut store).unwrap();
        collection.add_set(set(&["|b"], Some(S)), &mut store).unwrap();
        collection.add_set(set(&["|c"], None), &mut store).unwrap();
        collection
            .add_set(
                QuickSelectSet::new(["|d"], Some("Dee".into()), Some(E)).unwrap(),
                &mut store,
            )
            .unwrap();
        assert_eq!(tuples(&QuickSelectCollection::load("rig", &store).unwrap()), tuples(&collection));

        collection.remove_at_index(2, &mut store).unwrap();
        assert_eq!(tuples(&QuickSelectCollection::load("rig", &store).unwrap()), tuples(&collection));

        assert!(collection.remove_at_position(S, &mut store).unwrap());
        assert!(!collection.remove_at_position(W, &mut store).unwrap());
        let reloaded = QuickSelectCollection::load("rig", &store).unwrap();
        assert_eq!(tuples(&reloaded), tuples(&collection));
        assert_eq!(reloaded.len(), 2);

        collection.clear(&mut store).unwrap();
        assert!(QuickSelectCollection::load("rig", &store).unwrap().is_empty());
    }

    #[test]
    fn position_conflict_leaves_collection_unchanged() {
        let mut store = MemoryStore::new();
        let mut collection = QuickSelectCollection::new("rig");
        collection.add_set(set(&["|a"], Some(N)), &mut store).unwrap();
        let before = collection.clone();

        let err = collection
            .add_set(set(&["|b"], Some(N)), &mut store)
            .unwrap_err();
        assert!(matches!(err, QuickMenusError::PositionConflict(N)));
        assert_eq!(collection, before);
        assert_eq!(
            tuples(&QuickSelectCollection::load("rig", &store).unwrap()),
            tuples(&before)
        );

        collection.add_set(set(&["|b"], None), &mut store).unwrap();
        collection.add_set(set(&["|c"], None), &mut store).unwrap();
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn remove_at_index_checks_bounds() {
        let mut store = MemoryStore::new();
        let mut collection = QuickSelectCollection::new("rig");
        collection.add_set(set(&["|a"], None), &mut store).unwrap();

        let err = collection.remove_at_index(1, &mut store).unwrap_err();
        assert!(matches!(err, QuickMenusError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn modify_set_persists_and_guards_slots() {
        let mut store = MemoryStore::new();
        let mut collection = QuickSelectCollection::new("rig");
        collection.add_set(set(&["|a"], Some(N)), &mut store).unwrap();
        collection.add_set(set(&["|b"], Some(S)), &mut store).unwrap();

        collection
            .modify_set(0, &mut store, |quick| quick.add_nodes(["|x"]))
            .unwrap();
        let reloaded = QuickSelectCollection::load("rig", &store).unwrap();
        assert_eq!(reloaded.sets()[0].nodes().len(), 2);

        let err = collection
            .modify_set(1, &mut store, |quick| {
                quick.set_position(Some(N));
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, QuickMenusError::PositionConflict(N)));
        assert_eq!(collection.sets()[1].position(), Some(S));

        assert!(matches!(
            collection.modify_set(5, &mut store, |_| Ok(())),
            Err(QuickMenusError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn failed_write_keeps_memory_and_store_in_sync() {
        let mut store = FlakyStore::default();
        let mut collection = QuickSelectCollection::new("rig");
        collection.add_set(set(&["|a"], None), &mut store).unwrap();

        store.fail_writes = true;
        let err = collection.add_set(set(&["|b"], None), &mut store).unwrap_err();
        assert!(matches!(err, QuickMenusError::Persistence(_)));
        assert_eq!(collection.len(), 1);
        assert!(collection.clear(&mut store).is_err());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn rename_moves_record_to_new_key() {
        let mut store = MemoryStore::new();
        let mut collection = QuickSelectCollection::new("old");
        collection.add_set(set(&["|a"], Some(W)), &mut store).unwrap();

        collection.rename("new", &mut store).unwrap();
        assert_eq!(collection.name(), "new");
        assert_eq!(
            QuickSelectCollection::list_names(&store).unwrap(),
            vec!["new".to_string()]
        );
        assert_eq!(QuickSelectCollection::load("new", &store).unwrap().len(), 1);

        assert!(matches!(
            collection.rename("  ", &mut store),
            Err(QuickMenusError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rename_onto_existing_name_overwrites_it() {
        let mut store = MemoryStore::new();
        let mut first = QuickSelectCollection::new("first");
        first.add_set(set(&["|a"], None), &mut store).unwrap();
        let mut second = QuickSelectCollection::new("second");
        second.add_set(set(&["|b"], None), &mut store).unwrap();
        second.add_set(set(&["|c"], None), &mut store).unwrap();

        second.rename("first", &mut store).unwrap();
        assert_eq!(
            QuickSelectCollection::list_names(&store).unwrap(),
            vec!["first".to_string()]
        );
        assert_eq!(QuickSelectCollection::load("first", &store).unwrap().len(), 2);
    }
}
