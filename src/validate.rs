//! Structural checks run on every payload before it is uploaded.

use std::fmt::{Display, Formatter};

use crate::{
    error::Error,
    formats::{
        ResourceKind,
        strings::{Line, trim_invisible, unquote_key, unquote_value},
        stringsdict,
    },
};

/// One problem found in a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number, absent for whole-document XML failures.
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn document(message: impl Into<String>) -> Self {
        Diagnostic {
            line: None,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of [`validate`]. Valid when no diagnostics were collected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Line numbers that were reported, in order.
    pub fn lines(&self) -> Vec<usize> {
        self.diagnostics.iter().filter_map(|d| d.line).collect()
    }

    /// Turns a failed report into [`Error::Validation`].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.diagnostics.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

/// Checks `text` as a payload of the given kind.
///
/// Flat payloads are checked line by line and every offending line is
/// reported; pluralized payloads only need to be well-formed XML.
pub fn validate(text: &str, kind: ResourceKind) -> ValidationReport {
    let diagnostics = match kind {
        ResourceKind::Stringsdict => match stringsdict::check_well_formed(text) {
            Ok(()) => Vec::new(),
            Err(e) => vec![Diagnostic::document(format!(
                "failed to parse stringsdict file: {}",
                e
            ))],
        },
        ResourceKind::Strings => trim_invisible(text)
            .split('\n')
            .enumerate()
            .filter_map(|(index, line)| {
                check_line(line).map(|message| Diagnostic::at_line(index + 1, message))
            })
            .collect(),
    };

    ValidationReport { diagnostics }
}

fn check_line(raw: &str) -> Option<&'static str> {
    match Line::parse(raw) {
        Line::Blank | Line::Comment(_) => None,
        Line::Unrecognized => Some("invalid comment or string entry"),
        Line::Assignment { key, value } => {
            let quoted = key.len() >= 2
                && key.ends_with('"')
                && value.starts_with('"')
                && value.ends_with("\";");
            if !quoted {
                return Some("invalid string line");
            }
            let (key, value) = (unquote_key(key), unquote_value(value));
            if key.is_empty() || value.is_empty() {
                Some("invalid string line")
            } else if has_unescaped_quote(key) || has_unescaped_quote(value) {
                Some("invalid quote escapes")
            } else {
                None
            }
        }
    }
}

/// True when some `"` is preceded by an even number of backslashes.
fn has_unescaped_quote(text: &str) -> bool {
    let mut backslashes = 0usize;
    for c in text.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' if backslashes % 2 == 0 => return true,
            _ => backslashes = 0,
        }
    }
    false
}
