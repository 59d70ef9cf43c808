pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::FilterCriteria;

/// Fields searched when the user has not narrowed the search to one facet.
pub const DEFAULT_SEARCH_KEYS: [&str; 4] = ["name", "description", "folder", "supplier"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Item fields the smart filter compares against.
    pub search_keys: Vec<String>,
    /// The last active item filter, restored on startup.
    pub item_filter: FilterCriteria,
    /// Field the filtered catalog is re-sorted by; `None` keeps ranking order.
    pub sort_field: Option<String>,
    /// Selecting a folder also shows items filed in its subfolders.
    pub include_subfolders: bool,
    /// Label for the level above all root folders.
    pub root_label: String,
    pub last_snapshot: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_keys: DEFAULT_SEARCH_KEYS.iter().map(|k| k.to_string()).collect(),
            item_filter: FilterCriteria::new(),
            sort_field: Some("brand".to_string()),
            include_subfolders: true,
            root_label: "Root".to_string(),
            last_snapshot: None,
        }
    }
}
