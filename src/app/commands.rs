// src/app/commands.rs
//! Contains the command handlers that drive the catalog state.
//!
//! Each function in this module corresponds to a user action (typing in the
//! search box, picking a category chip) or to a collection update from the
//! document store. Handlers mutate the `AppState`, re-run the derived views and
//! send a `StateUpdate` to the UI through the event proxy.

use super::filtering;
use super::helpers::with_state_and_notify;
use super::proxy::EventProxy;
use super::state::{AppState, FOLDER_KEY, SEARCH_KEY, SUPPLIER_KEY};
use crate::app::events::UserEvent;
use crate::config::DEFAULT_SEARCH_KEYS;
use crate::core::{CatalogSource, FilterValue, Folder, Item};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

/// Fields searched from the free-text box; wider than the defaults.
const SEARCH_BOX_KEYS: [&str; 5] = ["name", "description", "folder", "supplier", "unit"];

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Re-runs the filter and stores it in the config after a filter change.
fn refresh_after_filter_change(s: &mut AppState) {
    filtering::apply_filters(s);
    s.persist_item_filter();
}

/// Replaces the whole filter with a free-text search.
pub fn set_search<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>, query: &str) {
    with_state_and_notify(state, proxy, |s| {
        s.item_filter.criteria.clear();
        s.item_filter
            .criteria
            .insert(SEARCH_KEY.to_string(), FilterValue::from(query));
        s.item_filter.search_keys = keys(&SEARCH_BOX_KEYS);
        refresh_after_filter_change(s);
    });
}

/// Narrows the catalog to one folder, or drops the folder criterion for `None`.
///
/// With `include_subfolders` on, items filed anywhere below the folder match too.
pub fn select_folder<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    folder_id: Option<&str>,
) {
    with_state_and_notify(state, proxy, |s| {
        match folder_id.filter(|id| !id.is_empty()) {
            None => {
                s.item_filter.criteria.shift_remove(FOLDER_KEY);
            }
            Some(id) => {
                let mut ids = vec![id.to_string()];
                if s.config.include_subfolders {
                    if let Some(node) = s.folder_tree.sub_tree(Some(id)) {
                        ids.extend(node.iter().skip(1).map(|f| f.id.clone()));
                    }
                }
                s.item_filter.criteria.clear();
                s.item_filter
                    .criteria
                    .insert(FOLDER_KEY.to_string(), FilterValue::AnyOf(ids));
            }
        }
        s.item_filter.search_keys = keys(&[FOLDER_KEY]);
        refresh_after_filter_change(s);
    });
}

/// Narrows the catalog to one supplier, or drops the supplier criterion for `None`.
pub fn select_supplier<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    supplier: Option<&str>,
) {
    with_state_and_notify(state, proxy, |s| {
        match supplier.filter(|name| !name.is_empty()) {
            None => {
                s.item_filter.criteria.shift_remove(SUPPLIER_KEY);
            }
            Some(name) => {
                s.item_filter.criteria.clear();
                s.item_filter.criteria.insert(
                    SUPPLIER_KEY.to_string(),
                    FilterValue::AnyOf(vec![name.to_string()]),
                );
            }
        }
        s.item_filter.search_keys = keys(&[SUPPLIER_KEY]);
        refresh_after_filter_change(s);
    });
}

/// Drops every criterion and restores the default search keys.
pub fn clear_filter<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>) {
    with_state_and_notify(state, proxy, |s| {
        s.item_filter.criteria.clear();
        s.item_filter.search_keys = keys(&DEFAULT_SEARCH_KEYS);
        refresh_after_filter_change(s);
    });
}

/// Replaces the folder collection, as a live subscription would.
pub fn replace_folders<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    folders: IndexMap<String, Folder>,
) {
    with_state_and_notify(state, proxy, |s| {
        s.folders = folders;
        s.rebuild_folder_tree();
    });
}

/// Replaces the item collection and re-runs the filter.
pub fn replace_items<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    items: IndexMap<String, Item>,
) {
    with_state_and_notify(state, proxy, |s| {
        s.items = items;
        filtering::apply_filters(s);
    });
}

/// Inserts or replaces one folder, keyed by its id.
pub fn upsert_folder<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>, folder: Folder) {
    with_state_and_notify(state, proxy, |s| {
        tracing::debug!(id = %folder.id, "Upserting folder");
        s.folders.insert(folder.id.clone(), folder);
        s.rebuild_folder_tree();
    });
}

/// Inserts or replaces one item, keyed by its id.
pub fn upsert_item<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>, item: Item) {
    with_state_and_notify(state, proxy, |s| {
        tracing::debug!(id = %item.id, "Upserting item");
        s.items.insert(item.id.clone(), item);
        filtering::apply_filters(s);
    });
}

/// Removes one item. Unknown ids are ignored.
pub fn remove_item<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>, item_id: &str) {
    with_state_and_notify(state, proxy, |s| {
        if s.items.shift_remove(item_id).is_none() {
            tracing::debug!(id = item_id, "Asked to remove an unknown item");
        }
        filtering::apply_filters(s);
    });
}

/// Pulls both collections from `source` and rebuilds every derived view.
///
/// The fetch happens before the state is locked. On failure the state is left
/// untouched and the UI is told about the error.
pub fn load_catalog<P: EventProxy, S: CatalogSource + ?Sized>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    source: &S,
) -> anyhow::Result<()> {
    let fetched = source.folders().and_then(|f| Ok((f, source.items()?)));
    let (folders, items) = match fetched {
        Ok(collections) => collections,
        Err(e) => {
            tracing::error!("Failed to load catalog: {}", e);
            proxy.send_event(UserEvent::ShowError(format!("Failed to load catalog: {e}")));
            return Err(e.into());
        }
    };

    tracing::info!(
        folders = folders.len(),
        items = items.len(),
        "Loaded catalog"
    );

    with_state_and_notify(state, proxy, |s| {
        s.folders = folders;
        s.items = items;
        s.rebuild_folder_tree();
        filtering::apply_filters(s);
    });
    Ok(())
}
