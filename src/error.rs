//! All error types for the stringsync crate.
//!
//! Codec and validator failures are reported synchronously to the caller.
//! Remote and timeout variants are produced by [`crate::service`] implementors
//! and propagated unchanged by the orchestration layer.

use thiserror::Error;

use crate::{formats::ResourceKind, validate::ValidationReport};

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("malformed property list: {0}")]
    MalformedPlist(String),

    #[error("payload is not valid {encoding}")]
    Decoding { encoding: &'static str },

    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    #[error("missing developer comments for: {}", .0.join(", "))]
    MissingComments(Vec<String>),

    #[error("cannot combine a {found} resource with a {expected} resource")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    #[error("invalid ticket id `{0}`")]
    InvalidTicket(String),

    #[error("no content to transfer for `{0}`")]
    EmptyPayload(String),

    #[error("remote error: {message}")]
    Remote {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{operation} did not finish after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new remote error with optional source error
    pub fn remote_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Remote {
            message: message.into(),
            source,
        }
    }

    /// Creates a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
