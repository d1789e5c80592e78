//! Utility modules for slugs and loosely-typed flag values.
//!
//! # Modules
//!
//! - [`slug`]: Slug normalization and shape checks
//! - [`flags`]: Boolean flag parsing from string forms

pub mod flags;
pub mod slug;
