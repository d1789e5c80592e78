//! # gazette-api
//!
//! HTTP API for Gazette.
//!
//! This crate provides:
//! - Public read routes serving published entries
//! - Admin routes for create, update, rename, delete, and publish toggling
//! - A bearer-token middleware delegating to a [`CredentialCheck`]
//! - Mapping from content errors to fixed JSON error bodies ([`ApiError`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gazette_api::{router, AdminAuthLayer, AppState, AuthConfig, StaticToken};
//! use gazette_storage::{ContentRepository, MemoryBackend};
//!
//! let state = AppState::new(ContentRepository::new(Arc::new(MemoryBackend::new())));
//! let auth = AdminAuthLayer::new(Arc::new(StaticToken::new("secret")), AuthConfig { enabled: true });
//! let app = router(state, auth);
//! axum::serve(listener, app).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod routes;

pub use auth::{AdminAuthLayer, AuthConfig, AuthError, CredentialCheck, StaticToken};
pub use error::{Action, ApiError};
pub use routes::{AppState, router};
