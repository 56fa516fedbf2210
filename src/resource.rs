//! Resource naming conventions shared by the service and the repository.

use std::fmt::{Display, Formatter};

use tracing::warn;

use crate::formats::{PLURALS_MARKER, ResourceKind};

/// Language folder of the source strings.
pub const BASE_LANGUAGE: &str = "Base";
/// Folder that mirrors [`BASE_LANGUAGE`] for the main resources.
pub const ENGLISH: &str = "en";

/// A resource name such as `Localizable` or `Localizable-feature`, where the
/// part after the first `-` names the branch the resource belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName {
    base: String,
    branch: Option<String>,
}

impl ResourceName {
    pub fn parse(name: &str) -> Self {
        match name.split_once('-') {
            Some((base, branch)) => ResourceName {
                base: base.to_string(),
                branch: Some(branch.to_string()),
            },
            None => ResourceName {
                base: name.to_string(),
                branch: None,
            },
        }
    }

    /// The branch resource of `self` for `branch`.
    pub fn with_branch(&self, branch: &str) -> Self {
        ResourceName {
            base: self.base.clone(),
            branch: Some(branch.to_string()),
        }
    }

    /// The main resource this one belongs to.
    pub fn main(&self) -> Self {
        ResourceName {
            base: self.base.clone(),
            branch: None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn is_branch(&self) -> bool {
        self.branch.is_some()
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::for_resource(&self.to_string())
    }

    /// Identifier the service derives from the name.
    pub fn slug(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// File name of the resource inside a `.lproj` folder.
    pub fn file_basename(&self) -> String {
        let name = self.to_string();
        if self.is_branch() {
            return match self.kind() {
                ResourceKind::Stringsdict => {
                    format!("{}.stringsdict", name.replace(PLURALS_MARKER, "Localizable"))
                }
                ResourceKind::Strings => format!("{}.strings", name),
            };
        }

        if name.contains(PLURALS_MARKER) {
            "Localizable.stringsdict".to_string()
        } else if name.contains("Localizable") {
            "Localizable.strings".to_string()
        } else if name.contains("InfoPlist") {
            "InfoPlist.strings".to_string()
        } else {
            warn!(
                resource = %name,
                "unexpected resource name, defaulting to Localizable.strings"
            );
            "Localizable.strings".to_string()
        }
    }

    /// Whether the base language copy is mirrored into the `en` folder.
    pub fn mirrors_english(&self) -> bool {
        ["Localizable", "InfoPlist", PLURALS_MARKER]
            .iter()
            .any(|marker| self.base.contains(marker))
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}-{}", self.base, branch),
            None => f.write_str(&self.base),
        }
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        ResourceName::parse(name)
    }
}

/// Resource suffix for a git branch. The long-lived branches have none.
pub fn branch_suffix(git_branch: &str) -> Option<String> {
    let git_branch = git_branch.trim();
    if matches!(git_branch, "master" | "develop" | "main") {
        return None;
    }
    let suffix: String = git_branch
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    (!suffix.is_empty()).then_some(suffix)
}

/// Store listing variants. `name` is matched loosely, so `storesvpn` and
/// `vpn` both select `vpn`; anything unrecognized selects `ios`.
pub fn stores_listing(name: &str) -> &'static str {
    if name.contains("vpn") {
        "vpn"
    } else if name.contains("password") {
        "password"
    } else {
        "ios"
    }
}

/// File name of a downloaded store listing.
pub fn stores_file_name(name: &str) -> String {
    format!("stores-{}.yaml", name.replace("stores", ""))
}

/// The `.lproj` folder name for a service language code.
pub fn lproj_code(code: &str) -> &str {
    match code {
        "zh_CN" => "zh-Hans",
        "zh_TW" => "zh-Hant",
        other => other,
    }
}
