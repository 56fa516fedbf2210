//! Localization sync toolkit for Apple string resources.
//!
//! Parses `.strings` tables and `.stringsdict` plural property lists into
//! ordered mappings, normalizes their typography for the direction they are
//! travelling in, merges them with overlay-wins precedence, and validates
//! payloads before they are uploaded to a translation service.
//!
//! The [`sync::Synchronizer`] drives whole operations (download, export,
//! branch upload, locking) against the [`service::TranslationService`] and
//! [`service::RepositorySource`] collaborators supplied by the caller.
//!
//! ```rust
//! use stringsync::{Direction, Document, ResourceKind};
//!
//! let english = Document::decode(
//!     "/* Title */\n\"title\"=\"Welcome...\";",
//!     Direction::Download,
//!     ResourceKind::Strings,
//! )?;
//! let spanish = Document::decode(
//!     "/* Title */\n\"title\"=\"\";",
//!     Direction::Download,
//!     ResourceKind::Strings,
//! )?;
//! let merged = english.merge(&spanish, true)?;
//! assert_eq!(merged.encode(Direction::Download), "/* Title */\n\"title\"=\"Welcome…\";");
//! # Ok::<(), stringsync::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod encoding;
pub mod error;
pub mod formats;
pub mod lock;
pub mod merge;
pub mod normalize;
pub mod resource;
pub mod service;
pub mod store;
pub mod sync;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export most used types for easy consumption
pub use crate::{
    config::{ResourceTable, SyncConfig},
    error::Error,
    formats::{Document, ResourceKind},
    normalize::normalize,
    resource::ResourceName,
    service::{Catalog, RepositorySource, TranslationService},
    store::ResourceStore,
    sync::Synchronizer,
    traits::Parser,
    types::{Direction, Entry, Mapping, PluralEntry},
    validate::{ValidationReport, validate},
};
