//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! This module acts as a presentation layer: it turns the folder forest into
//! rows of category chips, resolves display labels, and flattens the filtered
//! items into the order they are shown.

use crate::core::{FolderForest, Item, TreeNode};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

use super::state::AppState;

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    /// One row of chips per level of the selected folder's path.
    pub folder_rows: Vec<ChipRow>,
    /// Labels from the root label down to the selected folder.
    pub breadcrumb: Vec<String>,
    pub selected_folder: Option<String>,
    pub search_query: String,
    pub search_keys: Vec<String>,
    /// Visible items in display order.
    pub items: Vec<Item>,
    pub total_items: usize,
    pub visible_items: usize,
    pub total_folders: usize,
    pub status_message: String,
}

/// The chips offered at one level of the folder hierarchy.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChipRow {
    /// The folder whose children are listed; `None` for the root level.
    pub parent: Option<String>,
    pub chips: Vec<FolderChip>,
}

/// A selectable folder chip.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FolderChip {
    pub id: String,
    pub name: String,
    /// `true` if this folder lies on the path to the selected folder.
    pub selected: bool,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let selected_folder = state.item_filter.selected_folder();
    let path = state.folder_tree.folder_path(selected_folder);

    let breadcrumb = path
        .iter()
        .map(|id| state.folder_label(id.as_deref()))
        .collect();

    let status_message = match &state.tree_error {
        Some(error) => format!("Folder tree unavailable: {error}"),
        None => format!(
            "Showing {} of {} items.",
            state.filtered_items.len(),
            state.items.len()
        ),
    };

    UiState {
        folder_rows: folder_chip_rows(&state.folder_tree, &state.items, selected_folder),
        breadcrumb,
        selected_folder: selected_folder.map(str::to_string),
        search_query: state.item_filter.search_query().to_string(),
        search_keys: state.item_filter.search_keys.clone(),
        items: state.filtered_items.values().cloned().collect(),
        total_items: state.items.len(),
        visible_items: state.filtered_items.len(),
        total_folders: state.folders.len(),
        status_message,
    }
}

/// Builds the category chip rows for browsing down to `selected`.
///
/// Each row lists the children of one level on the selected folder's path (the
/// roots for the top level). Folders without children and without any item filed
/// directly under them are skipped.
pub fn folder_chip_rows(
    forest: &FolderForest,
    items: &IndexMap<String, Item>,
    selected: Option<&str>,
) -> Vec<ChipRow> {
    let folders_with_items: HashSet<&str> =
        items.values().filter_map(|i| i.folder.as_deref()).collect();

    let path = forest.folder_path(selected);

    path.iter()
        .enumerate()
        .map(|(level, parent)| {
            let candidates: Vec<TreeNode<'_>> = match parent {
                None => forest.roots().collect(),
                Some(id) => forest
                    .sub_tree(Some(id))
                    .map(|node| node.children().collect())
                    .unwrap_or_default(),
            };
            let on_path = path.get(level + 1).and_then(|id| id.as_deref());

            let chips = candidates
                .into_iter()
                .filter(|node| {
                    node.has_children() || folders_with_items.contains(node.data().id.as_str())
                })
                .map(|node| FolderChip {
                    id: node.data().id.clone(),
                    name: node.data().name.clone(),
                    selected: on_path == Some(node.data().id.as_str()),
                })
                .collect();

            ChipRow {
                parent: parent.clone(),
                chips,
            }
        })
        .collect()
}
