use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::record::PathRecord;

/// A pathbuilder as delivered by the schema source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathbuilderRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_adapter")]
    pub adapter: String,
    /// Paths in breadth-first order when the source sent a nested tree.
    #[serde(default, deserialize_with = "path_listing")]
    pub paths: Vec<PathRecord>,
}

impl PathbuilderRecord {
    pub fn new(id: &str, paths: Vec<PathRecord>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            adapter: default_adapter(),
            paths,
        }
    }
}

/// Flattens a path listing into records.
///
/// Accepts a plain list of records, or the nested form keyed by path id
/// where each record carries its sub-paths under `children`.
pub fn flatten_paths(listing: &Value) -> Result<Vec<PathRecord>, serde_json::Error> {
    let mut records = Vec::new();
    let mut level = entries(listing);
    while !level.is_empty() {
        let mut next = Vec::new();
        for entry in level {
            records.push(PathRecord::deserialize(entry)?);
            if let Some(children) = entry.get("children") {
                next.extend(entries(children));
            }
        }
        level = next;
    }
    Ok(records)
}

fn entries(listing: &Value) -> Vec<&Value> {
    match listing {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn default_adapter() -> String {
    "default".to_string()
}

fn path_listing<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PathRecord>, D::Error> {
    let listing = Value::deserialize(deserializer)?;
    flatten_paths(&listing).map_err(serde::de::Error::custom)
}
