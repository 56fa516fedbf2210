//! Tag-lock planning for remote string records.
//!
//! A string is locked on the translation service by carrying the
//! `do_not_translate` tag plus one `locked_<code>` tag per language. These
//! functions only compute the tag updates; sending them is up to the caller.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DO_NOT_TRANSLATE: &str = "do_not_translate";
pub const CHANGE_LOG: &str = "change_log";
/// Set by translators on strings that must never be translated. Survives an
/// unlock, which also restores [`DO_NOT_TRANSLATE`] next to it.
pub const NO_TRANSLATE: &str = "notranslate";

lazy_static! {
    static ref TICKET_REGEX: Regex = Regex::new(r"^[A-Z]{2,4}-\d+").unwrap();
}

/// A source string as reported by the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StringRecord {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    /// Last modification, in Unix seconds.
    pub modified: u64,
}

/// New metadata for one remote string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagUpdate {
    pub id: String,
    pub tags: Vec<String>,
    /// Only sent when present.
    pub instructions: Option<String>,
}

/// The tag set that marks a string as locked for every language.
pub fn locked_tags<'a>(
    language_codes: impl IntoIterator<Item = &'a str>,
    is_changelog: bool,
) -> Vec<String> {
    let mut tags = vec![DO_NOT_TRANSLATE.to_string()];
    if is_changelog {
        tags.push(CHANGE_LOG.to_string());
    }
    tags.extend(language_codes.into_iter().map(|code| format!("locked_{}", code)));
    tags
}

/// Locks every record modified at or after `since` that is not fully locked
/// yet, prefixing its instructions with `ticket`.
pub fn plan_lock(
    records: &[StringRecord],
    since: u64,
    tags: &[String],
    ticket: &str,
) -> Vec<TagUpdate> {
    records
        .iter()
        .filter(|record| record.modified >= since)
        .filter_map(|record| {
            let tags = complete_tags(&record.tags, tags)?;
            let instructions = format!(
                "{} {}",
                ticket,
                record.instructions.as_deref().unwrap_or_default()
            );
            let instructions = instructions.trim();
            Some(TagUpdate {
                id: record.id.clone(),
                tags,
                instructions: (!instructions.is_empty()).then(|| instructions.to_string()),
            })
        })
        .collect()
}

/// Locks records whose developer comment was just edited, regardless of when
/// they were last modified. Instructions are left alone.
pub fn plan_comment_lock(records: &[StringRecord], tags: &[String]) -> Vec<TagUpdate> {
    records
        .iter()
        .filter_map(|record| {
            Some(TagUpdate {
                id: record.id.clone(),
                tags: complete_tags(&record.tags, tags)?,
                instructions: None,
            })
        })
        .collect()
}

/// Removes the lock tags from every record that carries any of them.
pub fn plan_unlock(records: &[StringRecord], tags: &[String]) -> Vec<TagUpdate> {
    records
        .iter()
        .filter_map(|record| {
            let mut locked = false;
            let mut has_no_translate = false;
            let mut kept = Vec::new();
            for tag in &record.tags {
                if tag == NO_TRANSLATE {
                    has_no_translate = true;
                    locked = true;
                    kept.push(tag.clone());
                } else if tags.contains(tag) {
                    locked = true;
                } else {
                    kept.push(tag.clone());
                }
            }
            if !locked {
                return None;
            }
            if has_no_translate {
                kept.push(DO_NOT_TRANSLATE.to_string());
            }
            Some(TagUpdate {
                id: record.id.clone(),
                tags: kept,
                instructions: None,
            })
        })
        .collect()
}

/// Whether `id` looks like an issue tracker reference (`IOS-1234`).
pub fn is_valid_ticket(id: &str) -> bool {
    TICKET_REGEX.is_match(id)
}

/// `current` plus whatever `required` tags it lacks, or `None` when nothing
/// is missing.
fn complete_tags(current: &[String], required: &[String]) -> Option<Vec<String>> {
    let missing: Vec<String> = required
        .iter()
        .filter(|tag| !current.contains(tag))
        .cloned()
        .collect();
    if missing.is_empty() {
        return None;
    }
    let mut tags = current.to_vec();
    tags.extend(missing);
    Some(tags)
}
