//! Local filesystem backend.
//!
//! Entries live at `<root>/<collection>/<slug>.md`. Each write goes to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers see either the old or the new content, never a mix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use gazette_core::entry::ENTRY_EXTENSION;
use gazette_core::{EntryKind, Error, Result, is_valid_slug};

use crate::traits::{StorageBackend, StoredDocument, document_text, ensure_slug};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed storage rooted at a content directory.
#[derive(Debug, Clone)]
pub struct LocalFilesystemBackend {
    root: PathBuf,
}

impl LocalFilesystemBackend {
    /// Create a backend rooted at `root`. Collection directories are created
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The content directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, kind: EntryKind) -> PathBuf {
        self.root.join(kind.collection())
    }

    fn path_for(&self, kind: EntryKind, slug: &str) -> Result<PathBuf> {
        ensure_slug(slug)?;
        Ok(self
            .collection_dir(kind)
            .join(format!("{slug}.{ENTRY_EXTENSION}")))
    }

    async fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| Error::storage(format!("{} has no parent", path.display())))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io_with_path(e, dir))?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("entry");
        let temp = dir.join(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| Error::io_with_path(e, &temp))?;
        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(Error::io_with_path(e, path));
        }
        Ok(())
    }

    async fn remove_path(&self, kind: EntryKind, slug: &str, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::not_found(kind, slug)),
            Err(e) => return Err(Error::io_with_path(e, path)),
        }

        match tokio::fs::try_exists(path).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(Error::storage(format!(
                "{} still exists after removal",
                path.display()
            ))),
            Err(e) => Err(Error::io_with_path(e, path)),
        }
    }

    /// Put `path` back the way it was before a failed move.
    async fn restore(&self, path: &Path, displaced: Option<Vec<u8>>) -> Result<()> {
        match displaced {
            Some(previous) => self.write_atomic(path, &previous).await,
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(Error::io_with_path(e, path)),
            },
        }
    }
}

async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_with_path(e, path)),
    }
}

#[async_trait]
impl StorageBackend for LocalFilesystemBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self, kind: EntryKind, slug: &str) -> Result<Option<String>> {
        read_bytes(&self.path_for(kind, slug)?)
            .await?
            .map(|bytes| document_text(kind, slug, bytes))
            .transpose()
    }

    async fn scan(&self, kind: EntryKind) -> Result<Vec<StoredDocument>> {
        let dir = self.collection_dir(kind);
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_with_path(e, &dir)),
        };

        let mut documents = Vec::new();
        while let Some(item) = reader
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(e, &dir))?
        {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_valid_slug(slug) {
                log::debug!("Ignoring {} (not a slug)", path.display());
                continue;
            }
            let slug = slug.to_string();
            // Removed between read_dir and now.
            let Some(bytes) = read_bytes(&path).await? else {
                continue;
            };
            documents.push(StoredDocument::from_bytes(kind, slug, bytes));
        }

        documents.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(documents)
    }

    async fn write(
        &self,
        kind: EntryKind,
        slug: &str,
        previous_slug: Option<&str>,
        content: &str,
    ) -> Result<String> {
        let path = self.path_for(kind, slug)?;
        let previous = match previous_slug {
            Some(prev) if prev != slug => Some((prev, self.path_for(kind, prev)?)),
            _ => None,
        };

        let Some((prev_slug, prev_path)) = previous else {
            self.write_atomic(&path, content.as_bytes()).await?;
            log::debug!("Wrote {}", path.display());
            return Ok(slug.to_string());
        };

        let displaced = read_bytes(&path).await?;
        self.write_atomic(&path, content.as_bytes()).await?;

        if let Err(err) = self.remove_path(kind, prev_slug, &prev_path).await {
            log::warn!(
                "Moving {kind} '{prev_slug}' to '{slug}' failed removing the old file: {err}; rolling back"
            );
            if let Err(rollback) = self.restore(&path, displaced).await {
                log::error!("Rollback of {} failed: {rollback}", path.display());
            }
            return Err(err);
        }

        log::info!("Moved {kind} '{prev_slug}' to '{slug}'");
        Ok(slug.to_string())
    }

    async fn remove(&self, kind: EntryKind, slug: &str) -> Result<()> {
        let path = self.path_for(kind, slug)?;
        self.remove_path(kind, slug, &path).await?;
        log::info!("Removed {}", path.display());
        Ok(())
    }
}
