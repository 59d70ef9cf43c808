//! Ranks in-memory records against free-text and exact-membership criteria.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Folder, Item};

/// Criteria entries can be given as text (fuzzy) or as a list of accepted values (exact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Matched by case-insensitive edit distance.
    Text(String),
    /// Matched when a field equals any entry, ignoring case.
    AnyOf(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::AnyOf(values)
    }
}

/// Criteria keyed by an arbitrary label. Only the values take part in matching.
pub type FilterCriteria = IndexMap<String, FilterValue>;

/// Exposes the string fields of a record by name.
///
/// Returning `None` for non-string or missing fields keeps them out of matching.
pub trait Searchable {
    fn search_field(&self, key: &str) -> Option<&str>;
}

impl Searchable for Item {
    fn search_field(&self, key: &str) -> Option<&str> {
        match key {
            "id" => Some(&self.id),
            "description" => self.description.as_deref(),
            "brand" => Some(&self.brand),
            "folder" => self.folder.as_deref(),
            "size" => Some(&self.size),
            other => self.extra.get(other).and_then(|v| v.as_str()),
        }
    }
}

impl Searchable for Folder {
    fn search_field(&self, key: &str) -> Option<&str> {
        match key {
            "id" => Some(&self.id),
            "name" => Some(&self.name),
            "description" => self.description.as_deref(),
            "parentId" => self.parent_id.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for serde_json::Map<String, serde_json::Value> {
    fn search_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }
}

impl Searchable for serde_json::Value {
    fn search_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }
}

/// Below this many characters a text criterion accepts any searchable field.
const SHORT_QUERY_CHARS: usize = 3;

/// How one record fared against the criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MatchScore {
    close_enough: bool,
    /// Smallest edit distance seen over all text criteria; `None` if none were computed.
    least_distance: Option<usize>,
}

impl MatchScore {
    /// Records without a computed distance sort after every record that has one.
    fn sort_key(&self) -> (bool, usize) {
        match self.least_distance {
            Some(d) => (false, d),
            None => (true, 0),
        }
    }
}

/// A utility struct for ranking catalog records.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SmartFilter;

impl SmartFilter {
    /// Returns the records that match any criteria entry, closest first.
    ///
    /// Criteria entries are OR'ed. Text entries compare against every field listed
    /// in `search_keys`; list entries require a field to equal one of the values.
    /// With no criteria the input is returned as-is, in its original order.
    /// Ties keep the input order.
    pub fn filter<T, K>(
        items: &IndexMap<String, T>,
        criteria: &FilterCriteria,
        search_keys: &[K],
    ) -> IndexMap<String, T>
    where
        T: Searchable + Clone + Sync,
        K: AsRef<str> + Sync,
    {
        if criteria.is_empty() {
            return items.clone();
        }

        let criteria = Self::lowercase_criteria(criteria);

        let mut matches: Vec<(&String, &T, MatchScore)> = items
            .par_iter()
            .map(|(key, item)| (key, item, Self::score(item, &criteria, search_keys)))
            .filter(|(_, _, score)| score.close_enough)
            .collect();

        matches.sort_by_key(|(_, _, score)| score.sort_key());

        tracing::debug!(
            total = items.len(),
            matched = matches.len(),
            criteria = criteria.len(),
            "Applied smart filter"
        );

        matches
            .into_iter()
            .map(|(key, item, _)| (key.clone(), item.clone()))
            .collect()
    }

    /// Checks a single record against the criteria without ranking.
    pub fn matches<T, K>(item: &T, criteria: &FilterCriteria, search_keys: &[K]) -> bool
    where
        T: Searchable,
        K: AsRef<str>,
    {
        criteria.is_empty()
            || Self::score(item, &Self::lowercase_criteria(criteria), search_keys).close_enough
    }

    fn lowercase_criteria(criteria: &FilterCriteria) -> Vec<FilterValue> {
        criteria
            .values()
            .map(|value| match value {
                FilterValue::Text(text) => FilterValue::Text(text.to_lowercase()),
                FilterValue::AnyOf(values) => {
                    FilterValue::AnyOf(values.iter().map(|v| v.to_lowercase()).collect())
                }
            })
            .collect()
    }

    /// Scores a record against criteria whose values are already lower-cased.
    fn score<T, K>(item: &T, criteria: &[FilterValue], search_keys: &[K]) -> MatchScore
    where
        T: Searchable,
        K: AsRef<str>,
    {
        // Lowercased for comparison, paired with the char count of the stored value.
        let fields: Vec<(String, usize)> = search_keys
            .iter()
            .filter_map(|key| item.search_field(key.as_ref()))
            .map(|field| (field.to_lowercase(), field.chars().count()))
            .collect();

        let mut score = MatchScore {
            close_enough: false,
            least_distance: None,
        };

        for value in criteria {
            match value {
                FilterValue::AnyOf(accepted) => {
                    if fields.iter().any(|(field, _)| accepted.contains(field)) {
                        score.close_enough = true;
                    }
                }
                FilterValue::Text(query) => {
                    let query_len = query.chars().count();
                    for (field, stored_len) in &fields {
                        let distance = levenshtein_distance(query, field);
                        score.least_distance =
                            Some(score.least_distance.map_or(distance, |d| d.min(distance)));

                        // Longer fields tolerate proportionally more edits.
                        let slack = *stored_len as i64 - query_len as i64;
                        if query_len < SHORT_QUERY_CHARS || distance as i64 <= slack {
                            score.close_enough = true;
                        }
                    }
                }
            }
        }

        score
    }
}

/// Levenshtein edit distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev = (0..=b_len).collect::<Vec<_>>();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
