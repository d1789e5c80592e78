//! Front-matter codec, entry payloads, and validation.
//!
//! This crate turns loosely-typed input into validated [`Entry`] values and
//! moves entries to and from their persisted text form. It performs no I/O;
//! storage backends call into it.
//!
//! # Modules
//!
//! - [`frontmatter`]: Encode/decode Markdown files with YAML front matter
//! - [`payload`]: The JSON request shape for create/update operations
//! - [`validate`]: Field coercion and validation rules
//! - [`tags`]: Tag list cleaning shared by the codec and the validator
//!
//! # Example
//!
//! ```rust
//! use gazette_content::{decode_entry, encode_entry, validate, EntryPayload, ValidationDefaults};
//! use gazette_core::EntryKind;
//! use serde_json::json;
//!
//! let payload: EntryPayload = serde_json::from_value(json!({
//!     "title": "Hi There",
//!     "slug": "hi-there",
//!     "body": "Hello, world.",
//!     "tags": "news, local",
//! })).unwrap();
//!
//! let entry = validate(EntryKind::Article, &payload, ValidationDefaults::default()).unwrap();
//! let text = encode_entry(&entry).unwrap();
//! let back = decode_entry(EntryKind::Article, "hi-there", &text).unwrap();
//! assert_eq!(back, entry);
//! ```
//!
//! [`Entry`]: gazette_core::Entry

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod frontmatter;
pub mod payload;
pub mod tags;
pub mod validate;

// Re-export commonly used items
pub use frontmatter::{Document, decode, decode_entry, encode, encode_entry};
pub use payload::EntryPayload;
pub use validate::{ValidationDefaults, derive_slug, validate};
