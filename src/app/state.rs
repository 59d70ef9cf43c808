//! Defines the central, mutable state of the application.

use crate::config::{settings, AppConfig};
use crate::core::{FilterCriteria, FilterValue, Folder, FolderForest, Item};
use indexmap::IndexMap;
use std::path::PathBuf;

/// Criteria key used for folder (category) selection.
pub const FOLDER_KEY: &str = "folder";
/// Criteria key used for supplier selection.
pub const SUPPLIER_KEY: &str = "supplier";
/// Criteria key used for the free-text search box.
pub const SEARCH_KEY: &str = "search";

/// The active item filter: what to look for and which fields to look in.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFilter {
    pub criteria: FilterCriteria,
    pub search_keys: Vec<String>,
}

impl ItemFilter {
    /// The folder chosen in the category chips, if any.
    ///
    /// A folder criterion may list the whole subtree; the chosen folder is listed first.
    pub fn selected_folder(&self) -> Option<&str> {
        match self.criteria.get(FOLDER_KEY)? {
            FilterValue::Text(id) => Some(id.as_str()),
            FilterValue::AnyOf(ids) => ids.first().map(String::as_str),
        }
    }

    /// The current free-text query, or `""`.
    pub fn search_query(&self) -> &str {
        match self.criteria.get(SEARCH_KEY) {
            Some(FilterValue::Text(query)) => query,
            _ => "",
        }
    }
}

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` by the composition root so that
/// command handlers and collection listeners share one copy. The core algorithms
/// never see it; they receive the collections as parameters.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where the config is persisted. `None` keeps changes in memory only.
    pub config_path: Option<PathBuf>,
    /// All folders keyed by document id, in arrival order.
    pub folders: IndexMap<String, Folder>,
    /// All items keyed by document id, in arrival order.
    pub items: IndexMap<String, Item>,
    /// The forest built from `folders`.
    pub folder_tree: FolderForest,
    /// Set when the last tree build was rejected.
    pub tree_error: Option<String>,
    /// The active item filter.
    pub item_filter: ItemFilter,
    /// The items visible after filtering and sorting.
    pub filtered_items: IndexMap<String, Item>,
}

impl Default for AppState {
    /// Creates a default `AppState` instance, loading the configuration from disk.
    fn default() -> Self {
        let config_path = settings::get_config_file_path();
        let config = AppConfig::load().unwrap_or_default();
        let mut state = Self::new(config);
        state.config_path = config_path;
        state
    }
}

impl AppState {
    /// Creates an empty state around `config`, restoring its persisted item filter.
    pub fn new(config: AppConfig) -> Self {
        let item_filter = ItemFilter {
            criteria: config.item_filter.clone(),
            search_keys: config.search_keys.clone(),
        };
        Self {
            config,
            config_path: None,
            folders: IndexMap::new(),
            items: IndexMap::new(),
            folder_tree: FolderForest::default(),
            tree_error: None,
            item_filter,
            filtered_items: IndexMap::new(),
        }
    }

    /// Rebuilds `folder_tree` from `folders`.
    ///
    /// A rejected build leaves an empty forest and records the reason in `tree_error`.
    pub fn rebuild_folder_tree(&mut self) {
        match FolderForest::build(self.folders.values()) {
            Ok(forest) => {
                self.folder_tree = forest;
                self.tree_error = None;
            }
            Err(e) => {
                tracing::error!("Failed to build folder tree: {}", e);
                self.folder_tree = FolderForest::default();
                self.tree_error = Some(e.to_string());
            }
        }
    }

    /// Copies the active filter into the config and writes it out if a path is set.
    pub fn persist_item_filter(&mut self) {
        self.config.item_filter = self.item_filter.criteria.clone();
        if let Some(path) = &self.config_path {
            if let Err(e) = settings::save_config(&self.config, Some(path)) {
                tracing::warn!("Failed to save item filter: {}", e);
            }
        }
    }

    /// Display name for a folder id, falling back to the root label.
    pub fn folder_label(&self, folder_id: Option<&str>) -> String {
        folder_id
            .and_then(|id| self.folders.get(id))
            .map(|f| f.name.clone())
            .unwrap_or_else(|| self.config.root_label.clone())
    }
}
