//! Schema-on-write record store
//!
//! This module provides a generic tabular container whose schema is declared at
//! run time. Producers fetch a [`Collection`] by name, declare the properties
//! they need, and append items. Nothing in here knows about detectors.
//!
//! # Design
//!
//! - Collections are held in creation order and looked up by name. The store is
//!   an explicit object owned by the caller, never a global.
//! - A property's type is fixed the first time its name is declared on a
//!   collection. Re-declaring with the same type hands back the same
//!   [`Property`]; a different type is a [`StoreError::TypeConflict`].
//! - Values are a closed set of variants ([`PropertyValue`]) checked against
//!   the declared type on every assignment.
//! - Items are rows in insertion order. [`RecordStore::clear_items`] drops the
//!   rows of every collection but keeps the schema, which is how the event loop
//!   starts a new event.

mod collection;
mod types;

pub use collection::*;
pub use types::*;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Collection names carry their schema version as a `_V<n>` suffix.
static COLLECTION_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)_V(\d+)$").expect("Invalid collection name regex pattern")
});

/// A collection name split into its base and schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionName {
    pub base: String,
    pub version: u32,
}

impl CollectionName {
    pub fn new(base: &str, version: u32) -> Self {
        Self {
            base: base.to_string(),
            version,
        }
    }

    /// Parse `Base_V<n>`. Returns `None` when there is no version suffix.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = COLLECTION_NAME_RE.captures(name)?;
        let version = caps[2].parse().ok()?;
        Some(Self {
            base: caps[1].to_string(),
            version,
        })
    }
}

impl std::fmt::Display for CollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_V{}", self.base, self.version)
    }
}

/// Owner of every collection written during a run.
#[derive(Debug, Default)]
pub struct RecordStore {
    collections: Vec<Collection>,
    // Key: collection name -> index into `collections`
    by_name: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the collection called `name`, creating an empty one if needed.
    pub fn collection(&mut self, name: &str) -> &mut Collection {
        let index = match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                let index = self.collections.len();
                if CollectionName::parse(name).is_none() {
                    tracing::warn!("Collection {} has no _V<n> version suffix", name);
                }
                tracing::debug!("Creating collection {}", name);
                self.collections.push(Collection::new(name));
                self.by_name.insert(name.to_string(), index);
                index
            }
        };
        &mut self.collections[index]
    }

    /// Read-only lookup; does not create.
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.by_name.get(name).map(|&index| &self.collections[index])
    }

    /// Collections in creation order.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Total number of items across every collection.
    pub fn item_count(&self) -> usize {
        self.collections.iter().map(Collection::len).sum()
    }

    /// Drop all items, keeping collections and their properties.
    pub fn clear_items(&mut self) {
        for collection in &mut self.collections {
            collection.clear_items();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_is_created_once() {
        let mut store = RecordStore::new();
        store.collection("Products_V1").add_property("Product", "").unwrap();
        store.collection("Products_V1");
        assert_eq!(store.collections().len(), 1);
        assert_eq!(store.get("Products_V1").unwrap().properties().len(), 1);
    }

    #[test]
    fn test_collection_creation_order() {
        let mut store = RecordStore::new();
        store.collection("B_V1");
        store.collection("A_V1");
        store.collection("B_V1");
        let names: Vec<&str> = store.collections().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["B_V1", "A_V1"]);
    }

    #[test]
    fn test_get_does_not_create() {
        let store = RecordStore::new();
        assert!(store.get("Missing_V1").is_none());
    }

    #[test]
    fn test_clear_items_keeps_schema() {
        let mut store = RecordStore::new();
        let coll = store.collection("EERecHits_V2");
        let e = coll.add_property("energy", 0.0).unwrap();
        coll.create();
        coll.create();
        assert_eq!(store.item_count(), 2);

        store.clear_items();
        assert_eq!(store.item_count(), 0);
        let coll = store.collection("EERecHits_V2");
        assert_eq!(coll.property("energy"), Some(e));
    }

    #[test]
    fn test_collection_name_parse() {
        let name = CollectionName::parse("EERecHits_V2").unwrap();
        assert_eq!(name.base, "EERecHits");
        assert_eq!(name.version, 2);
        assert_eq!(name.to_string(), "EERecHits_V2");

        assert!(CollectionName::parse("Products").is_none());
        assert!(CollectionName::parse("_V1").is_none());
    }
}
