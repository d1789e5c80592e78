//! Error types for Gazette.
//!
//! One taxonomy is shared by the codec, the validator, every storage backend,
//! and the repository façade. The HTTP layer maps variants to status codes;
//! nothing here knows about HTTP.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::entry::EntryKind;

/// Result type alias for Gazette operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Payload field the issue refers to (wire name, e.g. `startsAt`).
    pub field: String,
    /// Human-readable message suitable for form feedback.
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in Gazette.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The payload failed validation. Carries every issue found, in rule order.
    #[error("Validation failed: {}", join_issues(.issues))]
    Validation {
        /// All issues, in the order the rules were applied.
        issues: Vec<ValidationIssue>,
    },

    /// No entry exists under the given key.
    #[error("{} not found: {slug}", .kind.label())]
    NotFound {
        /// Entry kind that was looked up.
        kind: EntryKind,
        /// Slug that was looked up.
        slug: String,
    },

    /// An entry with this slug already exists for the kind.
    #[error("{} with slug '{slug}' already exists", .kind.label())]
    Conflict {
        /// Entry kind.
        kind: EntryKind,
        /// Conflicting slug.
        slug: String,
    },

    /// The backend cannot serve requests (missing credential, auth rejected).
    #[error("Backend '{backend}' unavailable: {message}")]
    BackendUnavailable {
        /// Backend name.
        backend: String,
        /// What went wrong.
        message: String,
    },

    /// Stored content could not be parsed.
    #[error("Malformed content in {location}: {message}")]
    MalformedContent {
        /// Storage key or path of the offending document.
        location: String,
        /// What went wrong.
        message: String,
    },

    /// Generic storage failure.
    #[error("Storage error: {message}")]
    Storage {
        /// What went wrong.
        message: String,
        /// Source error if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem I/O failure.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A remote call exceeded its deadline.
    #[error("Operation timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Returns whether the same call may succeed if tried again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::BackendUnavailable { .. } => true,
            Error::Io { .. } => true,
            Error::Storage { .. } => true,
            Error::Validation { .. } => false,
            Error::NotFound { .. } => false,
            Error::Conflict { .. } => false,
            Error::MalformedContent { .. } => false,
            Error::Config { .. } => false,
        }
    }

    /// Returns whether this is a failure of the storage medium itself, as
    /// opposed to a domain outcome (missing entry, duplicate slug, bad input).
    ///
    /// Only backend failures are eligible for a retry on an alternate backend.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Error::BackendUnavailable { .. }
                | Error::Storage { .. }
                | Error::Io { .. }
                | Error::Timeout { .. }
        )
    }

    /// Creates a validation error from a list of issues.
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        Error::Validation { issues }
    }

    /// Creates a validation error with a single issue.
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            issues: vec![ValidationIssue::new(field, message)],
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: EntryKind, slug: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            slug: slug.into(),
        }
    }

    /// Creates a duplicate-slug error.
    pub fn conflict(kind: EntryKind, slug: impl Into<String>) -> Self {
        Error::Conflict {
            kind,
            slug: slug.into(),
        }
    }

    /// Creates a backend-unavailable error.
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-content error.
    pub fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedContent {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates a storage error with a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error with a message and source error.
    pub fn storage_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Validation issues, if this is a validation error.
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Error::Validation { issues } => Some(issues),
            _ => None,
        }
    }
}
