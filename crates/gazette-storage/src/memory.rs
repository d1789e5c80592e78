//! In-memory backend.
//!
//! Used by tests and by `backend = "memory"` for throwaway local runs.
//! Contents are lost when the process exits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use gazette_core::{EntryKind, Error, Result};
use tokio::sync::RwLock;

use crate::traits::{StorageBackend, StoredDocument, ensure_slug};

/// Map-backed storage.
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    documents: RwLock<BTreeMap<(EntryKind, String), String>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend named `memory`.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create an empty backend with a custom name (useful when several are
    /// composed in one test).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store raw text under a key without validation or encoding.
    pub async fn insert_raw(&self, kind: EntryKind, slug: impl Into<String>, content: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert((kind, slug.into()), content.into());
    }

    /// Slugs currently stored for a kind, in key order.
    pub async fn keys(&self, kind: EntryKind) -> Vec<String> {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, slug)| slug.clone())
            .collect()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, kind: EntryKind, slug: &str) -> Result<Option<String>> {
        ensure_slug(slug)?;
        Ok(self
            .documents
            .read()
            .await
            .get(&(kind, slug.to_string()))
            .cloned())
    }

    async fn scan(&self, kind: EntryKind) -> Result<Vec<StoredDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, slug), content)| StoredDocument::new(slug.clone(), content.clone()))
            .collect())
    }

    async fn write(
        &self,
        kind: EntryKind,
        slug: &str,
        previous_slug: Option<&str>,
        content: &str,
    ) -> Result<String> {
        ensure_slug(slug)?;
        let mut documents = self.documents.write().await;

        if let Some(prev) = previous_slug.filter(|prev| *prev != slug) {
            ensure_slug(prev)?;
            // The whole move happens under one lock, so checking first is
            // equivalent to write-then-rollback.
            if documents.remove(&(kind, prev.to_string())).is_none() {
                return Err(Error::not_found(kind, prev));
            }
        }

        documents.insert((kind, slug.to_string()), content.to_string());
        Ok(slug.to_string())
    }

    async fn remove(&self, kind: EntryKind, slug: &str) -> Result<()> {
        ensure_slug(slug)?;
        self.documents
            .write()
            .await
            .remove(&(kind, slug.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(kind, slug))
    }
}
