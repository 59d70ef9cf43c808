//! This module is responsible for mutating the application state by applying filters.
//!
//! It takes the `AppState` and rebuilds `filtered_items` from the full item
//! collection, the active `ItemFilter` and the configured sort field.

use crate::app::state::{AppState, ItemFilter};
use crate::core::{locale_cmp, Item, Searchable, SmartFilter};
use indexmap::IndexMap;

/// Applies the current filter to the full item collection to generate the visible list.
pub fn apply_filters(state: &mut AppState) {
    state.filtered_items = apply_filters_on_data(
        &state.items,
        &state.item_filter,
        state.config.sort_field.as_deref(),
    );
}

/// A "pure" function that ranks items against the filter, then optionally re-sorts them.
fn apply_filters_on_data(
    items: &IndexMap<String, Item>,
    filter: &ItemFilter,
    sort_field: Option<&str>,
) -> IndexMap<String, Item> {
    let mut filtered = SmartFilter::filter(items, &filter.criteria, &filter.search_keys);

    if let Some(field) = sort_field {
        filtered.sort_by(|_, a, _, b| {
            locale_cmp(
                a.search_field(field).unwrap_or_default(),
                b.search_field(field).unwrap_or_default(),
            )
        });
    }

    filtered
}
