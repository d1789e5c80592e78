//! # gazette-storage
//!
//! Storage backends and the content repository façade.
//!
//! This crate provides:
//! - The [`StorageBackend`] trait every backend satisfies identically
//! - [`LocalFilesystemBackend`]: Markdown files under a content directory
//! - [`GitHubBackend`]: the same files in a GitHub repository, one commit per write
//! - [`MemoryBackend`]: in-process storage for tests and local demos
//! - [`FallbackBackend`]: retries backend failures once on an alternate backend
//! - [`ContentRepository`]: the sole write path (validation + encoding + backend)
//! - [`StorageConfig`] and [`build_backend`]: backend selection at startup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod fallback;
pub mod filesystem;
pub mod github;
pub mod memory;
pub mod repository;
pub mod traits;

pub use config::{BackendKind, GitHubConfig, LocalConfig, StorageConfig, build_backend};
pub use fallback::FallbackBackend;
pub use filesystem::LocalFilesystemBackend;
pub use github::GitHubBackend;
pub use memory::MemoryBackend;
pub use repository::{CheckIssue, ContentRepository};
pub use traits::{StorageBackend, StoredDocument, sort_entries};
