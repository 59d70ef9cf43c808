//! Pure catalog logic: record types, the folder tree engine and the smart item filter.
//!
//! Nothing in this module performs I/O except `source`, which is the seam to
//! whatever fetches the collections.

pub mod error;
pub mod folder_tree;
pub mod search;
pub mod source;
pub mod tree_generator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub use error::CoreError;
pub use folder_tree::{FolderForest, TreeIter, TreeNode};
pub use search::{FilterCriteria, FilterValue, Searchable, SmartFilter};
pub use source::{CatalogSource, JsonSnapshotSource};
pub use tree_generator::TreeGenerator;

/// A named grouping node in the catalog hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `None` marks a root folder.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<String>,
}

impl Folder {
    /// Creates an empty root folder with a fresh id and timestamps.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            description: Some(String::new()),
            parent_id: None,
            created_at: Some(now),
            updated_at: Some(now),
            shared_with: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.as_deref().is_none_or(str::is_empty)
    }
}

impl Default for Folder {
    fn default() -> Self {
        Self::new()
    }
}

/// A product listed in the catalog.
///
/// Fields the storefront does not model explicitly (`name`, `supplier`, `unit`, ...)
/// are kept in `extra` so the filter can still search them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub size: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            price: 0.0,
            description: Some(String::new()),
            brand: String::new(),
            images: Vec::new(),
            folder: None,
            archived: false,
            size: String::new(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders two display strings the way a browser's `localeCompare` roughly does:
/// accents and case are ignored first, then unaccented before accented, then
/// lowercase before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Lowercased base letters: decomposed with the combining marks dropped.
fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
