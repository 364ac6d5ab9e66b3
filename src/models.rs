//! Frontend Models
//!
//! Data structures shared by the catalog cache, ranking drafts and zone index.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable catalog identifier
pub type ItemId = String;

/// Id -> item lookup built from a catalog snapshot
pub type ItemLookup = HashMap<ItemId, Item>;

/// Catalog entry (matches backend)
///
/// Never mutated by this crate; only collections of items get reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Category tags (types, generation, ...)
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
    /// Anything else the backend sends along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            tags: Vec::new(),
            stats: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

/// Server-authoritative item set with its version token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: i64,
    pub items: Vec<Item>,
}

/// A named, colored ordinal interval (tier)
///
/// `interval` is `[start, end]`, 1-based and inclusive; `end = None`
/// extends to the end of the collection. Serialized as `[start, end|null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub interval: (i64, Option<i64>),
    pub color: String,
}

impl Zone {
    pub fn new(name: impl Into<String>, start: i64, end: Option<i64>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interval: (start, end),
            color: color.into(),
        }
    }

    pub fn start(&self) -> i64 {
        self.interval.0
    }

    pub fn end(&self) -> Option<i64> {
        self.interval.1
    }

    /// Whether a 1-based position falls inside this zone
    pub fn contains(&self, position: usize) -> bool {
        let position = position as i64;
        position >= self.start() && self.end().map_or(true, |end| position <= end)
    }
}

/// Committed ranking as last seen from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub id: String,
    #[serde(default)]
    pub version: i64,
    /// Ordered items; position in the vec is the rank
    pub items: Vec<Item>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// Persisted draft blob for one ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDraft {
    pub item_ids: Vec<ItemId>,
    /// Unix millis of the last local edit
    pub updated_at: i64,
}

/// Ordered ids of a collection
pub fn ids_of(items: &[Item]) -> Vec<ItemId> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// Positional comparison: same length and same id at every index
pub fn same_order(a: &[Item], b: &[Item]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}
