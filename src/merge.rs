//! Right-biased merging and diffing of mappings.
//!
//! Merges never fail and never flag conflicts: the overlay wins every key
//! collision. Callers express precedence by the order of their merge calls,
//! lowest precedence first.

use crate::types::{Entry, Mapping, PluralEntry};

/// Entries that can take part in a restricted merge.
pub trait Mergeable: Clone + PartialEq {
    /// Whether the entry may replace a base entry when merging is restricted
    /// to non-empty translations.
    fn carries_translation(&self) -> bool;
}

impl Mergeable for Entry {
    fn carries_translation(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

impl Mergeable for PluralEntry {
    fn carries_translation(&self) -> bool {
        true
    }
}

/// Returns a copy of `base` with every entry of `overlay` applied on top.
///
/// With `restrict_to_non_empty`, flat overlay entries whose value is blank are
/// ignored; plural entries always apply.
pub fn merge<E: Mergeable>(
    base: &Mapping<E>,
    overlay: &Mapping<E>,
    restrict_to_non_empty: bool,
) -> Mapping<E> {
    let mut result = base.clone();
    result.extend(
        overlay
            .iter()
            .filter(|(_, entry)| !restrict_to_non_empty || entry.carries_translation())
            .map(|(key, entry)| (key.to_string(), entry.clone())),
    );
    result
}

/// Entries of `candidate` that are missing from `reference` or differ from
/// the entry stored there.
pub fn changed_entries<E: Mergeable>(reference: &Mapping<E>, candidate: &Mapping<E>) -> Mapping<E> {
    candidate
        .iter()
        .filter(|(key, entry)| reference.get(key) != Some(*entry))
        .map(|(key, entry)| (key.to_string(), entry.clone()))
        .collect()
}

/// Keys whose developer comment is absent or blank.
pub fn missing_comments(mapping: &Mapping<Entry>) -> Vec<String> {
    mapping
        .iter()
        .filter(|(_, entry)| entry.lacks_comment())
        .map(|(key, _)| key.to_string())
        .collect()
}
