//! Canonical, format-agnostic types for stringsync.
//! Codecs decode into these; encoders serialize these.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which side of the exchange a text is travelling towards.
///
/// `Upload` prepares repository text for the translation service,
/// `Download` prepares service text for the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Upload,
    Download,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Upload => write!(f, "upload"),
            Direction::Download => write!(f, "download"),
        }
    }
}

/// A single `.strings` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Entry {
    /// Developer comment. `None` means no comment line ever preceded the
    /// entry, which is distinct from an empty comment.
    #[serde(default)]
    pub comment: Option<String>,
    pub value: String,
}

impl Entry {
    pub fn new(comment: Option<&str>, value: impl Into<String>) -> Self {
        Entry {
            comment: comment.map(str::to_string),
            value: value.into(),
        }
    }

    /// True when the comment is absent or only whitespace.
    pub fn lacks_comment(&self) -> bool {
        self.comment
            .as_deref()
            .is_none_or(|comment| comment.trim().is_empty())
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.comment {
            Some(comment) => write!(f, "Entry {{ value: {}, comment: {} }}", self.value, comment),
            None => write!(f, "Entry {{ value: {} }}", self.value),
        }
    }
}

/// A single `.stringsdict` entry.
///
/// `format_variable` is the `NSStringLocalizedFormatKey` value (e.g.
/// `%#@items_rule@`) and `format_context` names the nested rule dictionary.
/// `variants` maps plural category labels (`one`, `other`, ...) to format
/// strings, in the order they were read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PluralEntry {
    pub format_variable: String,
    pub format_context: String,
    #[serde(default)]
    pub variants: IndexMap<String, String>,
}

impl PluralEntry {
    pub fn new(
        format_variable: impl Into<String>,
        format_context: impl Into<String>,
        variants: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        PluralEntry {
            format_variable: format_variable.into(),
            format_context: format_context.into(),
            variants: variants.into_iter().collect(),
        }
    }
}

/// An insertion-ordered set of entries keyed by string key.
///
/// One mapping holds one resource/language pair in memory. Order only
/// affects serialization; equality ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Mapping<E> {
    entries: IndexMap<String, E>,
}

impl<E> Default for Mapping<E> {
    fn default() -> Self {
        Mapping {
            entries: IndexMap::new(),
        }
    }
}

impl<E> Mapping<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `key`.
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, entry: E) -> Option<E> {
        self.entries.insert(key.into(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }
}

impl<E> FromIterator<(String, E)> for Mapping<E> {
    fn from_iter<T: IntoIterator<Item = (String, E)>>(iter: T) -> Self {
        Mapping {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<E> IntoIterator for Mapping<E> {
    type Item = (String, E);
    type IntoIter = indexmap::map::IntoIter<String, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<E> Extend<(String, E)> for Mapping<E> {
    fn extend<T: IntoIterator<Item = (String, E)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
