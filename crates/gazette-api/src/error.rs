//! HTTP error responses.
//!
//! Every response body is `{"error": "<message>"}`, plus `details` for
//! validation failures. Messages are fixed per variant; the underlying error
//! is logged where it is translated and never sent to the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gazette_core::{EntryKind, Error, ValidationIssue};
use serde_json::json;

/// What the handler was doing when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Reading one entry.
    Fetch,
    /// Listing a collection.
    List,
    /// Creating an entry.
    Create,
    /// Updating an entry or its published flag.
    Update,
    /// Removing an entry.
    Delete,
}

impl Action {
    /// Verb used in `Failed to <verb> <type>`.
    pub fn verb(self) -> &'static str {
        match self {
            Action::Fetch => "fetch",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// An error as the HTTP client sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 400 with every validation issue.
    Validation(Vec<ValidationIssue>),
    /// 400 for a body that is not a JSON object of the expected shape.
    InvalidJson,
    /// 401 from the admin credential check.
    Unauthorized,
    /// 404 for a missing entry.
    NotFound(EntryKind),
    /// 404 for a collection segment that names no kind.
    UnknownType,
    /// 409 for a taken slug.
    Conflict(EntryKind),
    /// 503 when the storage backend cannot be used.
    Unavailable,
    /// 500 for everything else.
    Internal {
        /// Attempted action.
        action: Action,
        /// Entry kind involved.
        kind: EntryKind,
    },
}

impl ApiError {
    /// Log a content error with its context and translate it.
    pub fn from_content(err: Error, action: Action, kind: EntryKind) -> Self {
        let verb = action.verb();
        match err {
            Error::Validation { issues } => {
                tracing::debug!(%kind, action = verb, issues = issues.len(), "validation failed");
                ApiError::Validation(issues)
            }
            Error::NotFound { kind, slug } => {
                tracing::debug!(%kind, %slug, action = verb, "entry not found");
                ApiError::NotFound(kind)
            }
            Error::Conflict { kind, slug } => {
                tracing::info!(%kind, %slug, action = verb, "slug already taken");
                ApiError::Conflict(kind)
            }
            err @ (Error::BackendUnavailable { .. } | Error::Timeout { .. }) => {
                tracing::error!(%kind, action = verb, error = %err, "storage backend unavailable");
                ApiError::Unavailable
            }
            err => {
                tracing::error!(%kind, action = verb, error = %err, "content operation failed");
                ApiError::Internal { action, kind }
            }
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::UnknownType => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(_) => "Validation failed".to_string(),
            ApiError::InvalidJson => "Invalid JSON body".to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::NotFound(kind) => format!("{} not found", kind.label()),
            ApiError::UnknownType => "Unknown content type".to_string(),
            ApiError::Conflict(kind) => {
                format!("{} with this slug already exists", kind.label())
            }
            ApiError::Unavailable => "Storage backend unavailable".to_string(),
            ApiError::Internal { action, kind } => {
                format!("Failed to {} {}", action.verb(), kind.as_str())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(issues) => json!({
                "error": self.message(),
                "details": issues,
            }),
            _ => json!({ "error": self.message() }),
        };
        (status, Json(body)).into_response()
    }
}
