//! Local, case-insensitive substring matching.
//!
//! This is the fallback half of smart search. Short queries match against
//! names and tags only; the long-query fallback also looks inside
//! descriptions, which carry too much incidental text for one- and
//! two-character fragments.

use crate::models::Item;

/// Which item fields a local match inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFields {
    /// `name` and `tags`.
    NameAndTags,
    /// `name`, `tags` and `description`.
    WithDescription,
}

/// Whether `item` contains `needle` (already lower-cased) in any of `fields`.
pub fn item_matches(item: &Item, needle: &str, fields: MatchFields) -> bool {
    if item.name.to_lowercase().contains(needle) {
        return true;
    }
    if item
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle))
    {
        return true;
    }
    fields == MatchFields::WithDescription && item.description.to_lowercase().contains(needle)
}

/// Keep the items of `pool` that match `query`, preserving pool order.
///
/// `query` is trimmed and lower-cased here. An empty query matches
/// everything; an empty result is a valid "no matches" outcome.
pub fn filter_local(pool: &[Item], query: &str, fields: MatchFields) -> Vec<Item> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return pool.to_vec();
    }
    pool.iter()
        .filter(|item| item_matches(item, &needle, fields))
        .cloned()
        .collect()
}
