pub mod strings;
pub mod stringsdict;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

// Reexporting the formats for easier access
pub use strings::Format as StringsFormat;
pub use stringsdict::Format as StringsdictFormat;

use crate::{
    error::Error,
    merge,
    traits::Parser,
    types::{Direction, Entry, Mapping, PluralEntry},
};

/// The two resource shapes exchanged with the translation service.
///
/// A resource is pluralized exactly when its name carries the `Plurals`
/// marker; the two kinds never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Flat `.strings` table.
    Strings,
    /// Pluralized `.stringsdict` property list.
    Stringsdict,
}

/// Marker that makes a resource pluralized.
pub const PLURALS_MARKER: &str = "Plurals";

impl ResourceKind {
    pub fn for_resource(name: &str) -> Self {
        if name.contains(PLURALS_MARKER) {
            ResourceKind::Stringsdict
        } else {
            ResourceKind::Strings
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Strings => "strings",
            ResourceKind::Stringsdict => "stringsdict",
        }
    }

    /// The format identifier the translation service uses for this kind.
    pub fn i18n_format(&self) -> &'static str {
        match self {
            ResourceKind::Strings => "STRINGS",
            ResourceKind::Stringsdict => "STRINGSDICT",
        }
    }

    pub fn is_pluralized(&self) -> bool {
        matches!(self, ResourceKind::Stringsdict)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Accepts `strings`/`stringsdict` (case-insensitive, optional leading dot)
/// and the service identifiers `STRINGS`/`STRINGSDICT`.
impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "strings" => Ok(ResourceKind::Strings),
            "stringsdict" => Ok(ResourceKind::Stringsdict),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// A decoded resource of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Strings(Mapping<Entry>),
    Stringsdict(Mapping<PluralEntry>),
}

impl Document {
    /// Decodes `text` as `kind`, normalizing values for `direction`.
    pub fn decode(text: &str, direction: Direction, kind: ResourceKind) -> Result<Self, Error> {
        Ok(match kind {
            ResourceKind::Strings => {
                Document::Strings(StringsFormat::decode(text, direction)?.entries)
            }
            ResourceKind::Stringsdict => {
                Document::Stringsdict(StringsdictFormat::decode(text, direction)?.entries)
            }
        })
    }

    pub fn encode(&self, direction: Direction) -> String {
        match self {
            Document::Strings(entries) => StringsFormat::new(entries.clone()).encode(direction),
            Document::Stringsdict(entries) => {
                StringsdictFormat::new(entries.clone()).encode(direction)
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Document::Strings(_) => ResourceKind::Strings,
            Document::Stringsdict(_) => ResourceKind::Stringsdict,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Document::Strings(entries) => entries.len(),
            Document::Stringsdict(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        match self {
            Document::Strings(entries) => entries.keys().map(str::to_string).collect(),
            Document::Stringsdict(entries) => entries.keys().map(str::to_string).collect(),
        }
    }

    /// Overlays `overlay` on `self`; see [`merge::merge`].
    pub fn merge(&self, overlay: &Document, restrict_to_non_empty: bool) -> Result<Document, Error> {
        match (self, overlay) {
            (Document::Strings(base), Document::Strings(overlay)) => Ok(Document::Strings(
                merge::merge(base, overlay, restrict_to_non_empty),
            )),
            (Document::Stringsdict(base), Document::Stringsdict(overlay)) => Ok(
                Document::Stringsdict(merge::merge(base, overlay, restrict_to_non_empty)),
            ),
            _ => Err(self.mismatch(overlay)),
        }
    }

    /// Entries of `self` that are absent from or differ in `reference`.
    pub fn changed_since(&self, reference: &Document) -> Result<Document, Error> {
        match (self, reference) {
            (Document::Strings(candidate), Document::Strings(reference)) => Ok(
                Document::Strings(merge::changed_entries(reference, candidate)),
            ),
            (Document::Stringsdict(candidate), Document::Stringsdict(reference)) => Ok(
                Document::Stringsdict(merge::changed_entries(reference, candidate)),
            ),
            _ => Err(reference.mismatch(self)),
        }
    }

    /// Keys of flat entries without a usable developer comment.
    pub fn missing_comments(&self) -> Vec<String> {
        match self {
            Document::Strings(entries) => merge::missing_comments(entries),
            Document::Stringsdict(_) => Vec::new(),
        }
    }

    fn mismatch(&self, other: &Document) -> Error {
        Error::KindMismatch {
            expected: self.kind(),
            found: other.kind(),
        }
    }
}
