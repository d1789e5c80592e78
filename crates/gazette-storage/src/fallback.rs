//! Primary/alternate backend composition.
//!
//! Every call goes to the primary first. When it fails with a backend
//! failure (unreachable, rejected credential, I/O, timeout) the same call is
//! retried once on the alternate. Domain outcomes such as a missing entry or
//! a validation error pass through untouched. When both backends fail, the
//! primary's error is returned.

use std::sync::Arc;

use async_trait::async_trait;
use gazette_core::{EntryKind, Error, Result};

use crate::traits::{StorageBackend, StoredDocument};

/// A backend that retries backend failures on an alternate.
pub struct FallbackBackend {
    primary: Arc<dyn StorageBackend>,
    alternate: Arc<dyn StorageBackend>,
    name: String,
}

impl std::fmt::Debug for FallbackBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackBackend")
            .field("name", &self.name)
            .finish()
    }
}

impl FallbackBackend {
    /// Compose a primary with an alternate.
    pub fn new(primary: Arc<dyn StorageBackend>, alternate: Arc<dyn StorageBackend>) -> Self {
        let name = format!("{}+{}", primary.name(), alternate.name());
        Self {
            primary,
            alternate,
            name,
        }
    }

    /// The primary backend.
    pub fn primary(&self) -> &Arc<dyn StorageBackend> {
        &self.primary
    }

    /// The alternate backend.
    pub fn alternate(&self) -> &Arc<dyn StorageBackend> {
        &self.alternate
    }

    fn should_retry(&self, op: &str, err: &Error) -> bool {
        if err.is_backend_failure() {
            log::warn!(
                "{op} on '{}' failed: {err}; retrying on '{}'",
                self.primary.name(),
                self.alternate.name()
            );
            true
        } else {
            false
        }
    }

    fn settle<T>(&self, op: &str, primary_err: Error, alternate: Result<T>) -> Result<T> {
        match alternate {
            Ok(value) => Ok(value),
            Err(alt_err) => {
                log::error!(
                    "{op} failed on both '{}' ({primary_err}) and '{}' ({alt_err})",
                    self.primary.name(),
                    self.alternate.name()
                );
                Err(primary_err)
            }
        }
    }
}

#[async_trait]
impl StorageBackend for FallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, kind: EntryKind, slug: &str) -> Result<Option<String>> {
        match self.primary.read(kind, slug).await {
            Err(err) if self.should_retry("read", &err) => {
                let alternate = self.alternate.read(kind, slug).await;
                self.settle("read", err, alternate)
            }
            other => other,
        }
    }

    async fn scan(&self, kind: EntryKind) -> Result<Vec<StoredDocument>> {
        match self.primary.scan(kind).await {
            Err(err) if self.should_retry("scan", &err) => {
                let alternate = self.alternate.scan(kind).await;
                self.settle("scan", err, alternate)
            }
            other => other,
        }
    }

    async fn write(
        &self,
        kind: EntryKind,
        slug: &str,
        previous_slug: Option<&str>,
        content: &str,
    ) -> Result<String> {
        match self.primary.write(kind, slug, previous_slug, content).await {
            Err(err) if self.should_retry("write", &err) => {
                let alternate = self
                    .alternate
                    .write(kind, slug, previous_slug, content)
                    .await;
                self.settle("write", err, alternate)
            }
            other => other,
        }
    }

    async fn remove(&self, kind: EntryKind, slug: &str) -> Result<()> {
        match self.primary.remove(kind, slug).await {
            Err(err) if self.should_retry("remove", &err) => {
                let alternate = self.alternate.remove(kind, slug).await;
                self.settle("remove", err, alternate)
            }
            other => other,
        }
    }
}
