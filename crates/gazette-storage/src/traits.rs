//! The storage backend contract.
//!
//! Backends move encoded documents keyed by `(kind, slug)`; they never see
//! payloads. Decoding and listing order are provided once here so every
//! backend behaves the same way.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gazette_content::decode_entry;
use gazette_content::validate::SLUG_SHAPE_MESSAGE;
use gazette_core::{Entry, EntryKind, Error, Result, is_valid_slug};

/// A raw stored document.
#[derive(Debug)]
pub struct StoredDocument {
    /// Storage key within the kind.
    pub slug: String,
    /// Encoded text (front matter + body), or why the stored bytes could not
    /// be read as text.
    pub content: Result<String>,
}

impl StoredDocument {
    /// A document whose text was read.
    pub fn new(slug: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            content: Ok(content.into()),
        }
    }

    /// A document from raw stored bytes.
    pub fn from_bytes(kind: EntryKind, slug: impl Into<String>, bytes: Vec<u8>) -> Self {
        let slug = slug.into();
        let content = document_text(kind, &slug, bytes);
        Self { slug, content }
    }

    /// A document that exists but cannot be read as text.
    pub fn unreadable(slug: impl Into<String>, error: Error) -> Self {
        Self {
            slug: slug.into(),
            content: Err(error),
        }
    }

    /// Decode into an entry.
    pub fn decode(self, kind: EntryKind) -> Result<Entry> {
        let text = self.content?;
        decode_entry(kind, &self.slug, &text)
    }
}

/// Stored bytes as text. Bytes that are not UTF-8 are malformed content, not
/// a storage failure.
pub(crate) fn document_text(kind: EntryKind, slug: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        Error::malformed(
            kind.relative_path(slug),
            format!("content is not valid UTF-8: {}", e.utf8_error()),
        )
    })
}

/// Abstract storage backend.
///
/// Implementations:
/// - `LocalFilesystemBackend`: files under a content directory
/// - `GitHubBackend`: files in a GitHub repository via the contents API
/// - `MemoryBackend`: in-process map
/// - `FallbackBackend`: primary + alternate composition
///
/// # Rename semantics
///
/// `write` with a `previous_slug` that differs from `slug` is a move: the new
/// key is written, then the old key removed. If the removal fails, the new
/// key is restored to what it held before and the removal error returned,
/// so a failed move never leaves the entry under two slugs.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend name for diagnostics and logs.
    fn name(&self) -> &str;

    /// Read the encoded document for a key. `None` when absent.
    async fn read(&self, kind: EntryKind, slug: &str) -> Result<Option<String>>;

    /// Read every document of a kind.
    async fn scan(&self, kind: EntryKind) -> Result<Vec<StoredDocument>>;

    /// Create, overwrite, or move a document. Returns the final slug.
    async fn write(
        &self,
        kind: EntryKind,
        slug: &str,
        previous_slug: Option<&str>,
        content: &str,
    ) -> Result<String>;

    /// Remove a document.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the key does not exist.
    async fn remove(&self, kind: EntryKind, slug: &str) -> Result<()>;

    /// Read and decode an entry. `None` (not an error) when absent.
    async fn get(&self, kind: EntryKind, slug: &str) -> Result<Option<Entry>> {
        match self.read(kind, slug).await? {
            Some(text) => decode_entry(kind, slug, &text).map(Some),
            None => Ok(None),
        }
    }

    /// Decode every entry of a kind, newest first.
    ///
    /// Documents that fail to decode are skipped with a warning so one broken
    /// file does not take down a listing page.
    async fn list(&self, kind: EntryKind) -> Result<Vec<Entry>> {
        let documents = self.scan(kind).await?;
        let mut entries = Vec::with_capacity(documents.len());
        for doc in documents {
            let slug = doc.slug.clone();
            match doc.decode(kind) {
                Ok(entry) => entries.push(entry),
                Err(e) => log::warn!("Skipping {slug} in {} listing: {e}", self.name()),
            }
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Whether a key exists. A document that cannot be decoded still
    /// occupies its key.
    async fn exists(&self, kind: EntryKind, slug: &str) -> Result<bool> {
        match self.read(kind, slug).await {
            Ok(text) => Ok(text.is_some()),
            Err(Error::MalformedContent { .. }) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

/// Reject keys that are not canonical slugs before they reach a path or URL.
pub(crate) fn ensure_slug(slug: &str) -> Result<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(Error::validation_field("slug", SLUG_SHAPE_MESSAGE))
    }
}

/// Sort entries by date, newest first; undated or unparseable dates last;
/// ties broken by slug so the order is stable for unchanged storage.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        let (date_a, date_b) = (date_key(&a.meta.date), date_key(&b.meta.date));
        date_b.cmp(&date_a).then_with(|| a.slug.cmp(&b.slug))
    });
}

/// Parse the date formats editors actually write.
fn date_key(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(date, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
