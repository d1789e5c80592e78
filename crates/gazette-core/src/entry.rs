//! The entry model: one article or event.
//!
//! An [`Entry`] is keyed by `(kind, slug)` and stored as a Markdown file at
//! `<collection>/<slug>.md`, where the collection is the plural kind name.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// File extension for stored entries.
pub const ENTRY_EXTENSION: &str = "md";

/// The kind of an entry. Determines the collection directory and which
/// extra fields apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A news article or blog post.
    Article,
    /// A dated event with location and start/end times.
    Event,
}

impl EntryKind {
    /// Every kind, in display order.
    pub const ALL: [EntryKind; 2] = [EntryKind::Article, EntryKind::Event];

    /// Singular lowercase name (`article`).
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Article => "article",
            EntryKind::Event => "event",
        }
    }

    /// Capitalized name used in user-facing messages (`Article`).
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Article => "Article",
            EntryKind::Event => "Event",
        }
    }

    /// Collection directory and URL segment (`articles`).
    pub fn collection(self) -> &'static str {
        match self {
            EntryKind::Article => "articles",
            EntryKind::Event => "events",
        }
    }

    /// Resolve a collection name (`articles`, `events`) to a kind.
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == collection)
    }

    /// Relative storage path for a slug: `articles/hello-world.md`.
    pub fn relative_path(self, slug: &str) -> String {
        format!("{}/{slug}.{ENTRY_EXTENSION}", self.collection())
    }

    /// Whether this kind carries event fields.
    pub fn has_event_fields(self) -> bool {
        matches!(self, EntryKind::Event)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    /// Accepts both singular (`article`) and collection (`articles`) forms.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.collection() == s)
            .ok_or_else(|| Error::config(format!("Unknown entry kind: '{s}'")))
    }
}

/// Front-matter metadata of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    /// Non-empty title.
    pub title: String,
    /// Short summary; empty when not set.
    pub excerpt: String,
    /// Publication or event date as written by the editor; empty when not set.
    pub date: String,
    /// Cover image path or URL; empty when not set.
    pub image: String,
    /// Ordered, trimmed, deduplicated tags.
    pub tags: Vec<String>,
    /// Whether the entry is visible on the public site.
    pub published: bool,
    /// Event venue. `None` for articles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Event start. `None` for articles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    /// Event end. `None` for articles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    /// Front-matter keys this version does not know about, kept verbatim.
    #[serde(skip)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for EntryMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            excerpt: String::new(),
            date: String::new(),
            image: String::new(),
            tags: Vec::new(),
            published: true,
            location: None,
            starts_at: None,
            ends_at: None,
            extra: BTreeMap::new(),
        }
    }
}

/// One article or event: metadata plus Markdown/HTML body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Primary key within the kind.
    pub slug: String,
    /// Front-matter metadata.
    #[serde(flatten)]
    pub meta: EntryMeta,
    /// Raw body text.
    pub body: String,
}

impl Entry {
    /// Assemble an entry.
    pub fn new(
        kind: EntryKind,
        slug: impl Into<String>,
        meta: EntryMeta,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            slug: slug.into(),
            meta,
            body: body.into(),
        }
    }

    /// Relative storage path of this entry.
    pub fn relative_path(&self) -> String {
        self.kind.relative_path(&self.slug)
    }
}
