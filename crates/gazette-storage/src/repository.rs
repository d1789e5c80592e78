//! The content repository façade.
//!
//! Every mutation of stored content goes through [`ContentRepository`]:
//! payloads are validated, entries encoded, and the result handed to the
//! configured backend. Nothing else writes to a backend.

use std::sync::Arc;

use gazette_content::{EntryPayload, ValidationDefaults, derive_slug, encode_entry, validate};
use gazette_core::{Entry, EntryKind, Error, Result, is_valid_slug};
use serde::Serialize;

use crate::traits::StorageBackend;

/// A stored document that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckIssue {
    /// Storage key of the document.
    pub slug: String,
    /// Why it failed.
    pub error: String,
}

/// Validated, encoded access to one storage backend.
#[derive(Clone)]
pub struct ContentRepository {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for ContentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRepository")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ContentRepository {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Fetch an entry. A slug that could never have been stored is simply
    /// absent.
    pub async fn get_entry(&self, kind: EntryKind, slug: &str) -> Result<Option<Entry>> {
        if !is_valid_slug(slug) {
            return Ok(None);
        }
        self.backend.get(kind, slug).await
    }

    /// Fetch an entry or fail with [`Error::NotFound`].
    pub async fn require_entry(&self, kind: EntryKind, slug: &str) -> Result<Entry> {
        self.get_entry(kind, slug)
            .await?
            .ok_or_else(|| Error::not_found(kind, slug))
    }

    /// Every entry of a kind, newest first.
    pub async fn list_entries(&self, kind: EntryKind) -> Result<Vec<Entry>> {
        self.backend.list(kind).await
    }

    /// Published entries of a kind, newest first.
    pub async fn list_published(&self, kind: EntryKind) -> Result<Vec<Entry>> {
        let mut entries = self.list_entries(kind).await?;
        entries.retain(|entry| entry.meta.published);
        Ok(entries)
    }

    /// Decode every stored document of a kind and report the ones that fail.
    pub async fn check(&self, kind: EntryKind) -> Result<Vec<CheckIssue>> {
        let documents = self.backend.scan(kind).await?;
        Ok(documents
            .into_iter()
            .filter_map(|doc| {
                let slug = doc.slug.clone();
                doc.decode(kind).err().map(|err| CheckIssue {
                    slug,
                    error: err.to_string(),
                })
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Encode and store an entry, moving it from `previous_slug` when that
    /// differs from the entry's slug. Returns the final slug.
    pub async fn write_entry(&self, entry: &Entry, previous_slug: Option<&str>) -> Result<String> {
        let content = encode_entry(entry)?;
        let slug = self
            .backend
            .write(entry.kind, &entry.slug, previous_slug, &content)
            .await?;
        log::debug!("Stored {} via {}", entry.relative_path(), self.backend.name());
        Ok(slug)
    }

    /// Remove an entry.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no entry has this slug.
    pub async fn remove_entry(&self, kind: EntryKind, slug: &str) -> Result<()> {
        if !is_valid_slug(slug) {
            return Err(Error::not_found(kind, slug));
        }
        self.backend.remove(kind, slug).await?;
        log::info!("Removed {kind} '{slug}'");
        Ok(())
    }

    /// Create an entry from a payload. The slug is derived from the title
    /// when the payload has none; `published` defaults to `true`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for missing or malformed required fields
    /// - [`Error::Conflict`] when the slug is taken
    pub async fn create_entry(&self, kind: EntryKind, payload: EntryPayload) -> Result<Entry> {
        let slug = derive_slug(&payload);
        let entry = validate(kind, &payload.with_slug(slug), ValidationDefaults::default())?;

        if self.backend.exists(kind, &entry.slug).await? {
            return Err(Error::conflict(kind, &entry.slug));
        }

        self.write_entry(&entry, None).await?;
        log::info!("Created {kind} '{}'", entry.slug);
        Ok(entry)
    }

    /// Update an entry. Fields the payload omits keep their stored values;
    /// a changed slug moves the entry.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when no entry has `slug`
    /// - [`Error::Validation`] when the merged entry is invalid
    /// - [`Error::Conflict`] when renaming onto an existing slug
    pub async fn update_entry(
        &self,
        kind: EntryKind,
        slug: &str,
        payload: EntryPayload,
    ) -> Result<Entry> {
        let existing = self.require_entry(kind, slug).await?;
        let merged = EntryPayload::from_entry(&existing).overlay(payload);
        let new_slug = derive_slug(&merged);
        let defaults = ValidationDefaults {
            published: existing.meta.published,
        };

        let mut entry = validate(kind, &merged.with_slug(new_slug), defaults)?;
        entry.meta.extra = existing.meta.extra;

        let renamed = entry.slug != slug;
        if renamed && self.backend.exists(kind, &entry.slug).await? {
            return Err(Error::conflict(kind, &entry.slug));
        }

        self.write_entry(&entry, Some(slug)).await?;
        if renamed {
            log::info!("Updated {kind} '{slug}' (now '{}')", entry.slug);
        } else {
            log::info!("Updated {kind} '{slug}'");
        }
        Ok(entry)
    }

    /// Set or flip the published flag. `None` flips the stored value.
    /// Returns the resulting value; storage is untouched when it does not
    /// change.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when no entry has `slug`
    /// - [`Error::Validation`] when the stored entry no longer validates
    pub async fn set_published(
        &self,
        kind: EntryKind,
        slug: &str,
        published: Option<bool>,
    ) -> Result<bool> {
        let existing = self.require_entry(kind, slug).await?;
        let target = published.unwrap_or(!existing.meta.published);
        if target == existing.meta.published {
            log::debug!("{kind} '{slug}' already has published={target}");
            return Ok(target);
        }

        let mut payload = EntryPayload::from_entry(&existing);
        payload.published = Some(serde_json::Value::Bool(target));
        let mut entry = validate(kind, &payload, ValidationDefaults { published: target })?;
        entry.meta.extra = existing.meta.extra;

        self.write_entry(&entry, None).await?;
        log::info!(
            "{} {kind} '{slug}'",
            if target { "Published" } else { "Unpublished" }
        );
        Ok(target)
    }
}
