//! Gazette Core: shared entry model, errors, and utilities.
//!
//! This crate provides the foundational types used across all Gazette crates.
//! It has no internal Gazette dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`entry`]: Entry kinds, entry metadata, and the `Entry` record
//! - [`error`]: Error taxonomy and Result alias
//! - [`util`]: Slug normalization and flag parsing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod entry;
pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use entry::{Entry, EntryKind, EntryMeta};
pub use error::{Error, Result, ValidationIssue};

// Convenience re-exports from util
pub use util::flags::parse_flag;
pub use util::slug::{is_valid_slug, normalize_slug};
