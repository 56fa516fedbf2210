//! Support for Apple `.strings` localization format.
//!
//! The dialect handled here is the one exchanged with the translation
//! service: one `/* comment */` line followed by one `"key"="value";` line
//! per entry. A comment applies to every following entry until the next
//! comment line.

use crate::{
    error::Error,
    normalize::normalize,
    traits::Parser,
    types::{Direction, Entry, Mapping},
};

/// Represents an Apple `.strings` localization file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Format {
    /// All entries in file order.
    pub entries: Mapping<Entry>,
}

impl Format {
    pub fn new(entries: Mapping<Entry>) -> Self {
        Format { entries }
    }
}

impl Parser for Format {
    /// Lines that are neither comments nor assignments are skipped here;
    /// [`crate::validate::validate`] is the place that reports them.
    fn decode(text: &str, direction: Direction) -> Result<Self, Error> {
        let (_, entries) = trim_invisible(text).split('\n').map(Line::parse).fold(
            (None::<&str>, Mapping::new()),
            |(comment, mut entries), line| match line {
                Line::Comment(body) => (Some(body), entries),
                Line::Assignment { key, value } => {
                    entries.insert(
                        unquote_key(key),
                        Entry {
                            comment: comment.map(str::to_string),
                            value: normalize(unquote_value(value), direction),
                        },
                    );
                    (comment, entries)
                }
                Line::Blank | Line::Unrecognized => (comment, entries),
            },
        );

        Ok(Format { entries })
    }

    /// In `Download` direction every entry gets a comment line (empty when
    /// none was recorded) and values are normalized once more; in `Upload`
    /// direction values are written as stored and absent comments are omitted.
    fn encode(&self, direction: Direction) -> String {
        let mut content = String::new();

        for (key, entry) in self.entries.iter() {
            match (&entry.comment, direction) {
                (Some(comment), _) => content.push_str(&format!("/* {} */\n", comment)),
                (None, Direction::Download) => content.push_str("/*  */\n"),
                (None, Direction::Upload) => {}
            }

            let value = match direction {
                Direction::Download => normalize(&entry.value, direction),
                Direction::Upload => entry.value.clone(),
            };
            content.push_str(&format!("\"{}\"=\"{}\";\n", key, value));
        }

        content.trim().to_string()
    }
}

impl From<Mapping<Entry>> for Format {
    fn from(entries: Mapping<Entry>) -> Self {
        Format { entries }
    }
}

impl From<Format> for Mapping<Entry> {
    fn from(format: Format) -> Self {
        format.entries
    }
}

/// Invisible format, control and separator code points that may surround a
/// file exchanged with the translation service.
pub fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{0020}'
            | '\u{007F}'..='\u{00A0}'
            | '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{08E2}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200F}'
            | '\u{2028}'..='\u{202F}'
            | '\u{205F}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{3000}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{13438}'
            | '\u{1BCA0}'
            | '\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Strips leading and trailing invisible characters from a whole file.
pub fn trim_invisible(text: &str) -> &str {
    text.trim_matches(is_invisible)
}

/// One trimmed line of a `.strings` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Blank,
    /// Body of a `/* ... */` line, trimmed.
    Comment(&'a str),
    /// The trimmed text on either side of the first `=`, quotes included.
    Assignment { key: &'a str, value: &'a str },
    Unrecognized,
}

impl<'a> Line<'a> {
    pub(crate) fn parse(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }

        if line.starts_with("/*") && line.ends_with("*/") {
            let body = line
                .strip_prefix("/*")
                .and_then(|rest| rest.strip_suffix("*/"))
                .unwrap_or("");
            return Line::Comment(body.trim());
        }

        if line.chars().count() >= 6 && line.starts_with('"') && line.ends_with(';') {
            if let Some((key, value)) = line.split_once('=') {
                return Line::Assignment {
                    key: key.trim(),
                    value: value.trim(),
                };
            }
        }

        Line::Unrecognized
    }
}

/// `"key"` -> `key`
pub(crate) fn unquote_key(key: &str) -> &str {
    strip_chars(key, 1, 1)
}

/// `"value";` -> `value`
pub(crate) fn unquote_value(value: &str) -> &str {
    strip_chars(value, 1, 2)
}

/// Drops `front` chars from the start and `back` chars from the end, yielding
/// an empty string when there is nothing in between.
fn strip_chars(s: &str, front: usize, back: usize) -> &str {
    let count = s.chars().count();
    if count <= front + back {
        return "";
    }
    let offset = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    &s[offset(front)..offset(count - back)]
}
