//! The create/update request shape.
//!
//! Admin forms and API clients send loosely-typed JSON: tags as a list or a
//! comma string, `published` as a boolean, a string, or a number. Every field
//! is therefore kept as an optional raw JSON value here and coerced later by
//! the validator.

use gazette_core::Entry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw entry fields as received from a client.
///
/// An absent field and an explicit `null` are the same: "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    /// Entry title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Explicit slug; derived from the title when absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Value>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Value>,
    /// Date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    /// Image path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    /// List of strings or a comma-delimited string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    /// Boolean, flag string, or number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<Value>,
    /// Markdown/HTML body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Event venue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// Event start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<Value>,
    /// Event end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Value>,
}

impl EntryPayload {
    /// Express a stored entry as a payload, used as the base for updates.
    pub fn from_entry(entry: &Entry) -> Self {
        let meta = &entry.meta;
        let text = |s: &str| Some(Value::String(s.to_string()));
        Self {
            title: text(&meta.title),
            slug: text(&entry.slug),
            excerpt: text(&meta.excerpt),
            date: text(&meta.date),
            image: text(&meta.image),
            tags: Some(Value::Array(
                meta.tags.iter().cloned().map(Value::String).collect(),
            )),
            published: Some(Value::Bool(meta.published)),
            body: text(&entry.body),
            location: meta.location.as_deref().and_then(text),
            starts_at: meta.starts_at.as_deref().and_then(text),
            ends_at: meta.ends_at.as_deref().and_then(text),
        }
    }

    /// Lay `incoming` over `self`: every field `incoming` provides wins,
    /// every field it omits keeps the value from `self`.
    pub fn overlay(self, incoming: EntryPayload) -> Self {
        Self {
            title: incoming.title.or(self.title),
            slug: incoming.slug.or(self.slug),
            excerpt: incoming.excerpt.or(self.excerpt),
            date: incoming.date.or(self.date),
            image: incoming.image.or(self.image),
            tags: incoming.tags.or(self.tags),
            published: incoming.published.or(self.published),
            body: incoming.body.or(self.body),
            location: incoming.location.or(self.location),
            starts_at: incoming.starts_at.or(self.starts_at),
            ends_at: incoming.ends_at.or(self.ends_at),
        }
    }

    /// Replace the slug.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(Value::String(slug.into()));
        self
    }
}
