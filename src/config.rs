//! Tool configuration.
//!
//! [`SyncConfig`] comes from an optional JSON file whose secrets may instead
//! be provided through the environment. [`ResourceTable`] lists the reserved
//! resources and the repository folder each one lives in.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{error::Error, resource::stores_listing};

/// Environment variable consulted when `apiToken` is not configured.
pub const API_TOKEN_ENV: &str = "TRANSIFEX_TOKEN";
/// Environment variable consulted when `gitLabToken` is not configured.
pub const GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";
/// Environment variable consulted when `botToken` is not configured.
pub const BOT_TOKEN_ENV: &str = "TRANSIFEX_BOT_TOKEN";
/// Environment variable consulted when `botUrl` is not configured.
pub const BOT_URL_ENV: &str = "TRANSIFEX_BOT_URL";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub api_token: Option<String>,
    pub git_lab_token: Option<String>,
    pub bot_token: Option<String>,
    pub bot_url: Option<String>,
    pub project_name: Option<String>,
    pub git_id: Option<u64>,
    pub git_default_branch: Option<String>,
    /// Repository-relative folder that receives non-reserved resources.
    pub lang_store_path: Option<PathBuf>,
    /// Library projects read `lib-resources.conf`.
    pub lib: bool,
    /// Store listing resource ids keyed by listing (`ios`, `vpn`, `password`).
    pub stores_resources: IndexMap<String, String>,
}

impl SyncConfig {
    /// Reads `path` when it exists, then fills missing secrets from the
    /// process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let config = if path.exists() {
            debug!(path = %path.display(), "reading configuration");
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            debug!(path = %path.display(), "no configuration file, using environment only");
            SyncConfig::default()
        };
        Ok(config.with_fallbacks(read_env_nonempty))
    }

    /// Fills every unset secret from `lookup`, keyed by environment name.
    pub fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (slot, name) in [
            (&mut self.api_token, API_TOKEN_ENV),
            (&mut self.git_lab_token, GITLAB_TOKEN_ENV),
            (&mut self.bot_token, BOT_TOKEN_ENV),
            (&mut self.bot_url, BOT_URL_ENV),
        ] {
            if slot.as_deref().is_none_or(str::is_empty) {
                *slot = lookup(name);
            }
        }
        self
    }

    /// Checks that the settings every operation needs are present.
    pub fn validate(&self) -> Result<(), Error> {
        if is_blank(&self.api_token) {
            return Err(Error::config_error("missing translation service token"));
        }
        if is_blank(&self.git_lab_token) {
            return Err(Error::config_error("missing repository token"));
        }
        if is_blank(&self.project_name) {
            return Err(Error::config_error("missing project name"));
        }
        Ok(())
    }

    /// Service id of the store listing resource selected by `name`; see
    /// [`stores_listing`].
    pub fn stores_resource_id(&self, name: &str) -> Result<&str, Error> {
        let listing = stores_listing(name);
        self.stores_resources
            .get(listing)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::config_error(format!("no stores resource configured for `{}`", listing))
            })
    }

    /// Name of the reserved-resource table for this project.
    pub fn resources_file_name(&self) -> String {
        if self.lib {
            "lib-resources.conf".to_string()
        } else {
            format!(
                "{}-resources.conf",
                self.project_name.as_deref().unwrap_or_default()
            )
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn read_env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Reserved resources and the repository folder that holds each one's
/// `.lproj` directories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceTable {
    root: PathBuf,
    paths: IndexMap<String, PathBuf>,
}

impl ResourceTable {
    /// Parses `Name relative/path` lines. Paths are resolved against `root`
    /// and must exist; invalid lines are logged and skipped.
    pub fn parse(text: &str, root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        let mut paths = IndexMap::new();

        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let fields: Vec<&str> = line.split(' ').collect();
            match fields.as_slice() {
                [name, path] if !name.contains('-') => {
                    let folder = root.join(path);
                    if folder.exists() {
                        paths.insert(name.to_string(), PathBuf::from(*path));
                    } else {
                        error!(folder = %folder.display(), "configured folder does not exist");
                    }
                }
                _ => warn!(line, "invalid resource configuration"),
            }
        }

        if paths.is_empty() {
            return Err(Error::config_error("no valid resource configurations"));
        }
        Ok(ResourceTable { root, paths })
    }

    pub fn load(path: impl AsRef<Path>, root: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config_error(format!(
                "missing resource configuration {}",
                path.display()
            )));
        }
        Self::parse(&fs::read_to_string(path)?, root)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.paths.contains_key(name)
    }

    /// Absolute folder of a reserved resource.
    pub fn folder(&self, name: &str) -> Option<PathBuf> {
        self.paths.get(name).map(|path| self.root.join(path))
    }

    /// Repository-relative folder of a reserved resource.
    pub fn relative_folder(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
