//! ig document output.
//!
//! A finished event is written as one JSON document:
//!
//! ```text
//! {
//!   "Types":        { "<collection>": [["<property>", "<type>"], ...] },
//!   "Collections":  { "<collection>": [[<value>, ...], ...] },
//!   "Associations": {}
//! }
//! ```
//!
//! Collections and properties appear in creation/declaration order and rows in
//! insertion order. `v3d` values are written as `[x, y, z]`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::event::EventId;
use crate::store::RecordStore;

/// Serialize the current contents of `store`.
pub fn to_ig_json(store: &RecordStore) -> Value {
    let mut types = Map::new();
    let mut collections = Map::new();

    for collection in store.collections() {
        let schema: Vec<Value> = collection
            .properties()
            .iter()
            .map(|p| serde_json::json!([p.name, p.ty.as_str()]))
            .collect();
        types.insert(collection.name().to_string(), Value::Array(schema));

        let rows: Vec<Value> = (0..collection.len())
            .filter_map(|i| collection.row(i))
            .map(|row| Value::Array(row.iter().map(|v| v.to_json()).collect()))
            .collect();
        collections.insert(collection.name().to_string(), Value::Array(rows));
    }

    serde_json::json!({
        "Types": Value::Object(types),
        "Collections": Value::Object(collections),
        "Associations": Value::Object(Map::new()),
    })
}

/// Output file layout of a run.
pub struct IgPaths {
    root: PathBuf,
}

impl IgPaths {
    /// Lay out files under `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            root: dir.to_path_buf(),
        }
    }

    /// `<dir>/Events/Run_<run>/Event_<event>.json`
    pub fn event(&self, id: EventId) -> PathBuf {
        self.root
            .join("Events")
            .join(format!("Run_{}", id.run))
            .join(format!("Event_{}.json", id.event))
    }

    /// Write `document` for event `id`, creating directories as needed.
    pub fn write_event(&self, id: EventId, document: &Value) -> Result<PathBuf> {
        let path = self.event(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(document)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
