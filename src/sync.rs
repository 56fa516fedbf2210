//! Orchestration of syncs between the repository and the translation service.
//!
//! The free functions are the text-level building blocks; [`Synchronizer`]
//! strings them together with the service, the repository and the local
//! store. Every payload is validated before it is uploaded.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::{
    encoding::{decode_payload, decode_utf8},
    error::Error,
    formats::{Document, ResourceKind},
    lock::{self, TagUpdate},
    resource::{BASE_LANGUAGE, ResourceName, lproj_code},
    service::{
        Catalog, Language, NewResource, RemoteResource, RepositorySource, TranslationService,
    },
    store::ResourceStore,
    types::{Direction, Mapping},
    validate::validate,
};

/// Posted on every string whose developer comment was changed.
pub const COMMENT_UPDATED_MESSAGE: &str =
    "The developer comment has been updated. Please check the new comment and update as needed.";

/// Strings modified this many seconds before an upload started are still
/// considered part of it.
const UPLOAD_GRACE_SECONDS: u64 = 30;

/// Turns service text into repository text.
pub fn process_as_download(text: &str, kind: ResourceKind) -> Result<String, Error> {
    Ok(Document::decode(text, Direction::Download, kind)?.encode(Direction::Download))
}

/// Turns repository text into service text.
pub fn process_as_upload(text: &str, kind: ResourceKind) -> Result<String, Error> {
    Ok(Document::decode(text, Direction::Upload, kind)?.encode(Direction::Upload))
}

/// Overlays `overlay` on `base`, both in repository form.
pub fn merge_texts(
    base: &str,
    overlay: &str,
    kind: ResourceKind,
    restrict_to_non_empty: bool,
) -> Result<String, Error> {
    let base = Document::decode(base, Direction::Download, kind)?;
    let overlay = Document::decode(overlay, Direction::Download, kind)?;
    Ok(base
        .merge(&overlay, restrict_to_non_empty)?
        .encode(Direction::Download))
}

/// Reduces a branch file to the entries that differ from the committed copy
/// and returns them ready for upload.
///
/// Fails with [`Error::MissingComments`] when a changed flat entry has no
/// developer comment. Without a committed copy every entry counts as changed.
pub fn prepare_branch_upload(
    file: &str,
    repository_file: Option<&str>,
    kind: ResourceKind,
) -> Result<String, Error> {
    let candidate = Document::decode(file, Direction::Download, kind)?;
    let reference = match repository_file {
        Some(text) => Document::decode(text, Direction::Download, kind)?,
        None => empty_document(kind),
    };

    let diff = candidate.changed_since(&reference)?;
    let missing = diff.missing_comments();
    if !missing.is_empty() {
        return Err(Error::MissingComments(missing));
    }
    process_as_upload(&diff.encode(Direction::Download), kind)
}

fn empty_document(kind: ResourceKind) -> Document {
    match kind {
        ResourceKind::Strings => Document::Strings(Mapping::new()),
        ResourceKind::Stringsdict => Document::Stringsdict(Mapping::new()),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// A language export that did not complete.
#[derive(Debug)]
pub struct ExportFailure {
    pub resource: String,
    pub language: String,
    pub error: Error,
}

/// Result of [`Synchronizer::export`].
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs sync operations for one project checkout.
pub struct Synchronizer<S, R> {
    catalog: Catalog<S>,
    repository: R,
    store: ResourceStore,
    branch: Option<String>,
}

impl<S, R> Synchronizer<S, R>
where
    S: TranslationService,
    R: RepositorySource,
{
    pub fn new(service: S, repository: R, store: ResourceStore) -> Self {
        Synchronizer {
            catalog: Catalog::new(service),
            repository,
            store,
            branch: None,
        }
    }

    /// Sets the branch suffix of the checkout, as given by
    /// [`crate::resource::branch_suffix`].
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Downloads the source file of `name` into the project.
    pub fn download(&self, name: &str) -> Result<Vec<PathBuf>, Error> {
        let resource = self.catalog.require_resource(name)?;
        info!(resource = name, "downloading");
        let content = self.source_text(&resource)?;
        self.store.store(
            &resource.resource_name(),
            &process_as_download(&content, resource.kind())?,
            BASE_LANGUAGE,
        )
    }

    /// Downloads the source file of `name` unchanged into `folder`.
    pub fn download_raw(&self, name: &str, folder: &Path) -> Result<PathBuf, Error> {
        let resource = self.catalog.require_resource(name)?;
        info!(resource = name, "downloading");
        let content = self.source_text(&resource)?;
        self.store
            .store_raw(&resource.resource_name(), &content, folder)
    }

    /// Merges `name` with its branch resource on top, then lays the result
    /// over the committed repository copy, and stores it for the base
    /// language or for `language`.
    pub fn merge_branch(
        &self,
        name: &str,
        branch_name: &str,
        language: Option<&Language>,
    ) -> Result<Vec<PathBuf>, Error> {
        let resource = self.catalog.require_resource(name)?;
        let branch_resource = self.catalog.require_resource(branch_name)?;
        let kind = resource.kind();
        info!(resource = name, branch = branch_name, "downloading and merging");

        let (main_text, branch_text) = match language {
            Some(language) => (
                self.translation_text(&resource, language)?,
                self.translation_text(&branch_resource, language)?,
            ),
            None => (
                self.source_text(&resource)?,
                self.source_text(&branch_resource)?,
            ),
        };
        let lproj = language.map_or(BASE_LANGUAGE, |language| lproj_code(&language.code));
        let main_name = resource.resource_name().main();

        let mut merged = merge_texts(&main_text, &branch_text, kind, false)?;
        match self.committed_file(&main_name, lproj)? {
            Some(committed) => merged = merge_texts(&committed, &merged, kind, false)?,
            None => warn!(resource = name, "resource is not tracked in the repository"),
        }

        self.store.store(&main_name, &merged, lproj)
    }

    /// Downloads every reserved resource into the project, merging in its
    /// branch resource when `merge` is set and one exists.
    ///
    /// Returns the source text of each resource that was downloaded
    /// directly, keyed by resource name.
    pub fn fetch(&self, merge: bool) -> Result<IndexMap<String, String>, Error> {
        let mut sources = IndexMap::new();

        for resource in self.reserved_resources()? {
            let name = resource.name.as_str();
            let branch_name = self.merge_target(merge, name)?;

            let outcome = match branch_name {
                Some(branch_name) => self.merge_branch(name, &branch_name, None).map(|_| ()),
                None => self.source_text(&resource).and_then(|content| {
                    let processed = process_as_download(&content, resource.kind())?;
                    self.store
                        .store(&resource.resource_name(), &processed, BASE_LANGUAGE)?;
                    sources.insert(name.to_string(), content);
                    Ok(())
                }),
            };
            if let Err(e) = outcome {
                error!(resource = name, error = %e, "failed to fetch resource");
            }
        }

        Ok(sources)
    }

    /// Downloads every language of the reserved resources (or only of
    /// `only`), one task per resource and language.
    ///
    /// Translations are laid over the English source so untranslated strings
    /// keep their source text. Failed tasks are logged and reported without
    /// stopping the others.
    pub fn export(&self, merge: bool, only: Option<&str>) -> Result<ExportReport, Error> {
        let languages = self.catalog.languages()?;
        let merge = merge && {
            if self.branch.is_none() {
                warn!("cannot export and merge for a branch on master, develop or main");
            }
            self.branch.is_some()
        };

        info!("exporting English");
        let sources = match only {
            Some(name) => {
                match self.merge_target(merge, name)? {
                    Some(branch_name) => self.merge_branch(name, &branch_name, None)?,
                    None => self.download(name)?,
                };
                IndexMap::new()
            }
            None => self.fetch(merge)?,
        };

        let resources: Vec<RemoteResource> = self
            .reserved_resources()?
            .into_iter()
            .filter(|resource| only.is_none_or(|name| resource.name == name))
            .collect();
        let tasks: Vec<(&RemoteResource, &Language)> = resources
            .iter()
            .inspect(|resource| info!(resource = %resource.name, "exporting languages"))
            .flat_map(|resource| languages.iter().map(move |language| (resource, language)))
            .collect();

        let outcomes: Vec<_> = tasks
            .par_iter()
            .map(|(resource, language)| {
                let baseline = sources.get(&resource.name).map(String::as_str);
                self.export_language(resource, language, baseline, merge)
                    .map_err(|error| ExportFailure {
                        resource: resource.name.clone(),
                        language: language.code.clone(),
                        error,
                    })
            })
            .collect();

        let mut report = ExportReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(paths) => report.written.extend(paths),
                Err(failure) => {
                    error!(
                        resource = %failure.resource,
                        language = %failure.language,
                        error = %failure.error,
                        "failed to export language"
                    );
                    report.failures.push(failure);
                }
            }
        }
        info!(files = report.written.len(), "export finished");
        Ok(report)
    }

    fn export_language(
        &self,
        resource: &RemoteResource,
        language: &Language,
        baseline: Option<&str>,
        merge: bool,
    ) -> Result<Vec<PathBuf>, Error> {
        if let Some(branch_name) = self.merge_target(merge, &resource.name)? {
            return self.merge_branch(&resource.name, &branch_name, Some(language));
        }

        let kind = resource.kind();
        let mut content = self.translation_text(resource, language)?;
        if let Some(baseline) = baseline {
            content = merge_texts(baseline, &content, kind, true)?;
        }
        self.store.store(
            &resource.resource_name(),
            &process_as_download(&content, kind)?,
            &language.code,
        )
    }

    /// Creates the resource for `name` on the current branch, or `name`
    /// itself when `feature` is set. An existing resource is returned as is.
    pub fn create_branch_resource(&self, name: &str, feature: bool) -> Result<RemoteResource, Error> {
        let resource_name = if feature {
            ResourceName::parse(name)
        } else {
            let branch = self.branch.as_deref().ok_or_else(|| {
                Error::config_error("branch resources cannot be created for master, develop or main")
            })?;
            ResourceName::parse(name).with_branch(branch)
        };
        let full_name = resource_name.to_string();

        if let Some(existing) = self.catalog.find_resource(&full_name, false)? {
            info!(resource = %full_name, "resource already exists");
            return Ok(existing);
        }

        self.catalog
            .service()
            .create_resource(&NewResource::for_name(&resource_name))?;
        info!(resource = %full_name, "created resource");
        self.catalog
            .find_resource(&full_name, true)?
            .ok_or(Error::UnknownResource(full_name))
    }

    /// Uploads `text` as the source of `name`, then locks what it changed.
    ///
    /// On a branch checkout only the entries that differ from the committed
    /// copy are sent, to the branch resource, which is created if needed.
    /// Returns the number of strings locked.
    pub fn upload(&self, name: &str, text: &str, ticket: &str) -> Result<usize, Error> {
        let kind = ResourceKind::for_resource(name);
        validate(text, kind).into_result()?;
        if !lock::is_valid_ticket(ticket) {
            return Err(Error::InvalidTicket(ticket.to_string()));
        }

        let (resource, payload) = match &self.branch {
            Some(_) => {
                let resource = self.create_branch_resource(name, false)?;
                let committed =
                    self.committed_file(&ResourceName::parse(name), BASE_LANGUAGE)?;
                let payload = prepare_branch_upload(text, committed.as_deref(), kind)?;
                (resource, payload)
            }
            None => (
                self.catalog.require_resource(name)?,
                process_as_upload(text, kind)?,
            ),
        };

        let since = unix_now().saturating_sub(UPLOAD_GRACE_SECONDS);
        info!(resource = %resource.name, "uploading file");
        self.catalog.service().upload_source(&resource, &payload)?;
        info!(resource = %resource.name, "upload completed");
        self.lock(&resource.name, since, ticket)
    }

    /// Locks every string of `name` modified at or after `since`, recording
    /// `ticket` in its instructions. Returns the number of strings updated.
    pub fn lock(&self, name: &str, since: u64, ticket: &str) -> Result<usize, Error> {
        let resource = self.catalog.require_resource(name)?;
        self.lock_resource(&resource, since, ticket)
    }

    fn lock_resource(
        &self,
        resource: &RemoteResource,
        since: u64,
        ticket: &str,
    ) -> Result<usize, Error> {
        let records = self.catalog.service().resource_strings(resource, None)?;
        let tags = self.locked_tags(resource.name == "Changelogs")?;

        let updates = lock::plan_lock(&records, since, &tags, ticket);
        if updates.is_empty() {
            warn!(resource = %resource.name, "resource is already locked or has no strings to lock");
        }
        self.apply(&updates)
    }

    /// Downloads the store listing resource `resource_id` as UTF-8 into the
    /// download folder, named after `listing`.
    pub fn download_stores(&self, listing: &str, resource_id: &str) -> Result<PathBuf, Error> {
        let resource = self.catalog.resource_by_id(resource_id)?;
        info!(resource = %resource.name, "downloading stores resource");
        let content = decode_utf8(&self.catalog.service().download_source(&resource)?)?;
        if content.trim().is_empty() {
            return Err(Error::EmptyPayload(resource.name));
        }
        self.store.store_stores(listing, &content)
    }

    /// Force-uploads `content` to the store listing resource `resource_id`,
    /// then locks every string modified by the upload. Returns the number of
    /// strings locked.
    pub fn upload_stores(&self, resource_id: &str, content: &str) -> Result<usize, Error> {
        if content.trim().is_empty() {
            return Err(Error::EmptyPayload(resource_id.to_string()));
        }
        let resource = self.catalog.resource_by_id(resource_id)?;

        let since = unix_now().saturating_sub(UPLOAD_GRACE_SECONDS);
        info!(resource = %resource.name, "uploading to stores resource");
        self.catalog
            .service()
            .force_upload_source(&resource, content)?;
        self.lock_resource(&resource, since, "")
    }

    /// Removes the lock tags from every string of `name`.
    pub fn unlock(&self, name: &str) -> Result<usize, Error> {
        let resource = self.catalog.require_resource(name)?;
        let records = self.catalog.service().resource_strings(&resource, None)?;
        let tags = self.locked_tags(false)?;

        let updates = lock::plan_unlock(&records, &tags);
        if updates.is_empty() {
            warn!(resource = name, "resource is already unlocked or has no strings");
        }
        self.apply(&updates)
    }

    /// Replaces developer comments of `name`, uploads the result, locks the
    /// edited strings and notifies their translators.
    ///
    /// Keys missing from the resource are skipped. Returns the number of
    /// strings that were locked and commented.
    pub fn update_comments(
        &self,
        name: &str,
        comments: &IndexMap<String, String>,
    ) -> Result<usize, Error> {
        let resource = self.catalog.require_resource(name)?;
        let Document::Strings(mut entries) =
            Document::decode(&self.source_text(&resource)?, Direction::Download, resource.kind())?
        else {
            return Err(Error::KindMismatch {
                expected: ResourceKind::Strings,
                found: ResourceKind::Stringsdict,
            });
        };

        let mut edited = Vec::new();
        for (key, comment) in comments {
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.comment = Some(comment.clone());
                    edited.push(key.as_str());
                }
                None => warn!(resource = name, key = %key, "no such string, skipping"),
            }
        }
        if edited.is_empty() {
            warn!(resource = name, "no strings were found to edit");
            return Ok(0);
        }

        let text = Document::Strings(entries).encode(Direction::Download);
        info!(resource = name, "updating developer comments");
        self.catalog
            .service()
            .upload_source(&resource, &process_as_upload(&text, ResourceKind::Strings)?)?;

        let mut records = Vec::new();
        for key in edited {
            let found = self.catalog.service().resource_strings(&resource, Some(key))?;
            records.extend(found.into_iter().filter(|record| record.key == key));
        }

        let updates = lock::plan_comment_lock(&records, &self.locked_tags(name == "Changelogs")?);
        let locked = self.apply(&updates)?;
        for update in &updates {
            self.catalog
                .service()
                .post_comment(&update.id, COMMENT_UPDATED_MESSAGE)?;
        }
        Ok(locked)
    }

    fn apply(&self, updates: &[TagUpdate]) -> Result<usize, Error> {
        for update in updates {
            self.catalog.service().update_string(update)?;
        }
        Ok(updates.len())
    }

    fn locked_tags(&self, is_changelog: bool) -> Result<Vec<String>, Error> {
        let languages = self.catalog.languages()?;
        Ok(lock::locked_tags(
            languages.iter().map(|language| language.code.as_str()),
            is_changelog,
        ))
    }

    /// The committed copy of a reserved resource in `<lproj>.lproj`.
    fn committed_file(&self, resource: &ResourceName, lproj: &str) -> Result<Option<String>, Error> {
        let name = resource.to_string();
        let Some(folder) = self.store.table().relative_folder(&name) else {
            warn!(resource = %name, "resource has no configured repository folder");
            return Ok(None);
        };
        let path = folder
            .join(format!("{}.lproj", lproj))
            .join(resource.file_basename());
        self.repository.committed_file(&path)
    }

    fn reserved_resources(&self) -> Result<Vec<RemoteResource>, Error> {
        let table = self.store.table();
        Ok(self
            .catalog
            .resources()?
            .into_iter()
            .filter(|resource| table.contains(&resource.name))
            .collect())
    }

    /// The branch resource to merge into `name`, when merging applies.
    fn merge_target(&self, merge: bool, name: &str) -> Result<Option<String>, Error> {
        let Some(branch) = self.branch.as_deref().filter(|_| merge) else {
            return Ok(None);
        };
        let branch_name = ResourceName::parse(name).with_branch(branch).to_string();
        Ok(self
            .catalog
            .find_resource(&branch_name, false)?
            .map(|_| branch_name))
    }

    fn source_text(&self, resource: &RemoteResource) -> Result<String, Error> {
        let bytes = self.catalog.service().download_source(resource)?;
        decode_payload(&bytes, resource.kind())
    }

    fn translation_text(&self, resource: &RemoteResource, language: &Language) -> Result<String, Error> {
        let bytes = self
            .catalog
            .service()
            .download_translation(resource, language)?;
        decode_payload(&bytes, resource.kind())
    }
}
