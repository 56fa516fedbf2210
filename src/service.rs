//! Interfaces to the systems a sync talks to.
//!
//! The HTTP client for the translation service and the repository file API
//! live outside this crate; they plug in through [`TranslationService`] and
//! [`RepositorySource`]. Implementations are expected to finish asynchronous
//! jobs themselves and report exhausted polling as [`Error::Timeout`].

use std::{
    collections::HashMap,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::Error,
    formats::ResourceKind,
    lock::{StringRecord, TagUpdate},
    resource::ResourceName,
};

/// A resource as listed by the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub string_count: u64,
}

impl RemoteResource {
    pub fn resource_name(&self) -> ResourceName {
        ResourceName::parse(&self.name)
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::for_resource(&self.name)
    }
}

/// Attributes of a resource to be created on the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewResource {
    pub name: String,
    pub slug: String,
    /// `STRINGS` or `STRINGSDICT`.
    pub i18n_format: &'static str,
}

impl NewResource {
    pub fn for_name(name: &ResourceName) -> Self {
        NewResource {
            name: name.to_string(),
            slug: name.slug(),
            i18n_format: name.kind().i18n_format(),
        }
    }
}

/// A target language of the project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Language {
    pub id: String,
    /// Service language code, e.g. `zh_CN`.
    pub code: String,
    pub name: String,
}

/// Operations the sync needs from the translation service.
///
/// Downloads return the raw payload bytes; see
/// [`crate::encoding::decode_payload`].
pub trait TranslationService: Send + Sync {
    fn resources(&self) -> Result<Vec<RemoteResource>, Error>;

    fn languages(&self) -> Result<Vec<Language>, Error>;

    fn create_resource(&self, resource: &NewResource) -> Result<(), Error>;

    /// The source (English) file of a resource.
    fn download_source(&self, resource: &RemoteResource) -> Result<Vec<u8>, Error>;

    /// A translation, with untranslated strings filled from the source.
    fn download_translation(
        &self,
        resource: &RemoteResource,
        language: &Language,
    ) -> Result<Vec<u8>, Error>;

    /// Replaces the source file of a resource.
    fn upload_source(&self, resource: &RemoteResource, content: &str) -> Result<(), Error>;

    /// Replaces the source file of a resource, overwriting strings whose
    /// source text was edited on the service as well.
    fn force_upload_source(&self, resource: &RemoteResource, content: &str) -> Result<(), Error>;

    /// Source strings of a resource, optionally only those with `key`.
    fn resource_strings(
        &self,
        resource: &RemoteResource,
        key: Option<&str>,
    ) -> Result<Vec<StringRecord>, Error>;

    fn update_string(&self, update: &TagUpdate) -> Result<(), Error>;

    /// Posts a comment on a source string, addressed to its translators.
    fn post_comment(&self, string_id: &str, message: &str) -> Result<(), Error>;

    fn username(&self, user_id: &str) -> Result<Option<String>, Error>;
}

/// Read access to the files committed on the repository's default branch.
pub trait RepositorySource: Send + Sync {
    /// Contents of the file at the repository-relative `path`, or `None`
    /// when no such file is committed.
    fn committed_file(&self, path: &Path) -> Result<Option<String>, Error>;
}

/// A [`TranslationService`] with the resource list, the language list and
/// user names cached for the lifetime of the catalog.
///
/// Caches fill on first use and are shared by every thread using the catalog.
#[derive(Debug)]
pub struct Catalog<S> {
    service: S,
    resources: Mutex<Option<Vec<RemoteResource>>>,
    languages: Mutex<Option<Vec<Language>>>,
    users: Mutex<HashMap<String, String>>,
}

impl<S: TranslationService> Catalog<S> {
    pub fn new(service: S) -> Self {
        Catalog {
            service,
            resources: Mutex::new(None),
            languages: Mutex::new(None),
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn resources(&self) -> Result<Vec<RemoteResource>, Error> {
        let mut cache = guard(&self.resources);
        if let Some(resources) = cache.as_ref() {
            return Ok(resources.clone());
        }
        debug!("fetching resource list");
        let resources = self.service.resources()?;
        *cache = Some(resources.clone());
        Ok(resources)
    }

    pub fn languages(&self) -> Result<Vec<Language>, Error> {
        let mut cache = guard(&self.languages);
        if let Some(languages) = cache.as_ref() {
            return Ok(languages.clone());
        }
        debug!("fetching language list");
        let languages = self.service.languages()?;
        *cache = Some(languages.clone());
        Ok(languages)
    }

    /// Looks a resource up by name, reloading the list first when `refresh`.
    pub fn find_resource(&self, name: &str, refresh: bool) -> Result<Option<RemoteResource>, Error> {
        if refresh {
            *guard(&self.resources) = None;
        }
        Ok(self
            .resources()?
            .into_iter()
            .find(|resource| resource.name == name))
    }

    /// Like [`Catalog::find_resource`] without refresh, failing with
    /// [`Error::UnknownResource`] when absent.
    pub fn require_resource(&self, name: &str) -> Result<RemoteResource, Error> {
        self.find_resource(name, false)?
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    /// Looks a resource up by its service id.
    pub fn resource_by_id(&self, id: &str) -> Result<RemoteResource, Error> {
        self.resources()?
            .into_iter()
            .find(|resource| resource.id == id)
            .ok_or_else(|| Error::UnknownResource(id.to_string()))
    }

    /// Display name of a user, falling back to the id itself.
    pub fn username(&self, user_id: &str) -> String {
        if let Some(name) = guard(&self.users).get(user_id) {
            return name.clone();
        }
        match self.service.username(user_id) {
            Ok(Some(name)) if !name.is_empty() => {
                guard(&self.users).insert(user_id.to_string(), name.clone());
                name
            }
            _ => user_id.to_string(),
        }
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
