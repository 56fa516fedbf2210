//! Local destinations of downloaded resources.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    config::ResourceTable,
    error::Error,
    resource::{BASE_LANGUAGE, ENGLISH, ResourceName, lproj_code, stores_file_name},
};

/// Resources whose files are staged in the download folder rather than
/// written into the project.
const CHANGELOGS: &str = "Changelogs";

/// Maps resources to files on disk and writes them.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    prod_folder: PathBuf,
    download_folder: PathBuf,
    table: ResourceTable,
}

impl ResourceStore {
    pub fn new(
        prod_folder: impl Into<PathBuf>,
        download_folder: impl Into<PathBuf>,
        table: ResourceTable,
    ) -> Self {
        ResourceStore {
            prod_folder: prod_folder.into(),
            download_folder: download_folder.into(),
            table,
        }
    }

    pub fn table(&self) -> &ResourceTable {
        &self.table
    }

    pub fn download_folder(&self) -> &Path {
        &self.download_folder
    }

    /// Where `resource` in `language` is written.
    ///
    /// Reserved resources go to their configured folder, changelogs to the
    /// download folder and everything else to the production folder.
    pub fn destination(&self, resource: &ResourceName, language: &str) -> PathBuf {
        let language = lproj_code(language);
        let name = resource.to_string();
        let lproj = format!("{}.lproj", language);

        if let Some(folder) = self.table.folder(&name) {
            folder.join(lproj).join(resource.file_basename())
        } else if name.contains(CHANGELOGS) {
            self.download_folder
                .join(format!("{}.strings-{}", CHANGELOGS, language))
        } else {
            self.prod_folder.join(lproj).join(resource.file_basename())
        }
    }

    /// Writes `content` for `resource` in `language` and returns every path
    /// written. The base language of the main resources is mirrored to `en`.
    pub fn store(
        &self,
        resource: &ResourceName,
        content: &str,
        language: &str,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut written = vec![self.destination(resource, language)];
        if lproj_code(language) == BASE_LANGUAGE && resource.mirrors_english() {
            written.push(self.destination(resource, ENGLISH));
        }

        for path in &written {
            info!(path = %path.display(), "saving file");
            write_file(path, content)?;
        }
        Ok(written)
    }

    /// Writes a store listing into the download folder.
    pub fn store_stores(&self, listing: &str, content: &str) -> Result<PathBuf, Error> {
        let path = self.download_folder.join(stores_file_name(listing));
        info!(path = %path.display(), "saving file");
        write_file(&path, content)?;
        Ok(path)
    }

    /// Writes `content` under `folder` with the resource's file name.
    pub fn store_raw(
        &self,
        resource: &ResourceName,
        content: &str,
        folder: &Path,
    ) -> Result<PathBuf, Error> {
        let path = folder.join(resource.file_basename());
        info!(path = %path.display(), "saving file");
        write_file(&path, content)?;
        Ok(path)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ResourceStore {
        fs::create_dir_all(dir.path().join("App/Resources")).unwrap();
        let table = ResourceTable::parse("Localizable App/Resources", dir.path()).unwrap();
        ResourceStore::new(dir.path().join("prod"), dir.path().join("download"), table)
    }

    #[test]
    fn test_destinations() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(
            store.destination(&"Localizable".into(), "zh_CN"),
            dir.path().join("App/Resources/zh-Hans.lproj/Localizable.strings")
        );
        assert_eq!(
            store.destination(&"Changelogs".into(), "es"),
            dir.path().join("download/Changelogs.strings-es")
        );
        assert_eq!(
            store.destination(&"Plurals".into(), "Base"),
            dir.path().join("prod/Base.lproj/Localizable.stringsdict")
        );
    }

    #[test]
    fn test_base_language_is_mirrored_to_english() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let written = store
            .store(&"Localizable".into(), "\"k\"=\"v\";", BASE_LANGUAGE)
            .unwrap();
        assert_eq!(written.len(), 2);
        let english = dir.path().join("App/Resources/en.lproj/Localizable.strings");
        assert_eq!(fs::read_to_string(english).unwrap(), "\"k\"=\"v\";");

        let changelog = store.store(&"Changelogs".into(), "x", BASE_LANGUAGE).unwrap();
        assert_eq!(changelog.len(), 1);
    }

    #[test]
    fn test_store_stores() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.store_stores("storesvpn", "title: VPN").unwrap();
        assert_eq!(path, dir.path().join("download/stores-vpn.yaml"));
        assert_eq!(fs::read_to_string(path).unwrap(), "title: VPN");
    }

    #[test]
    fn test_store_raw() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store
            .store_raw(&"Localizable-branch".into(), "raw", &dir.path().join("out"))
            .unwrap();
        assert_eq!(path, dir.path().join("out/Localizable-branch.strings"));
        assert_eq!(fs::read_to_string(path).unwrap(), "raw");
    }
}
