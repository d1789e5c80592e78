//! Entry validation and field coercion.
//!
//! Rules run in a fixed order and every violation is collected before
//! failing, so a form can show all problems at once:
//!
//! 1. `title` is required (non-empty after trimming)
//! 2. `slug` is required and must have slug shape
//! 3. `body` is required (non-empty after trimming)
//! 4. events get `location`, `startsAt`, `endsAt`, defaulting to `""`
//!
//! Odd-but-coercible input never fails: numbers and booleans in text fields
//! become strings, tags may be a list or a comma string, and `published`
//! accepts flag strings and numbers.

use gazette_core::util::flags::{flag_from_number, parse_flag};
use gazette_core::{
    Entry, EntryKind, EntryMeta, Error, Result, ValidationIssue, is_valid_slug, normalize_slug,
};
use serde_json::Value;

use crate::payload::EntryPayload;
use crate::tags::{clean_tags, split_tag_list};

/// Message for a slug that is present but badly shaped.
pub const SLUG_SHAPE_MESSAGE: &str =
    "Slug must contain only lowercase letters, numbers, and single hyphens";

/// Caller-supplied defaults for fields whose absence is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationDefaults {
    /// `published` value when the payload has none or an unrecognized one.
    /// `true` on create; the stored value on update.
    pub published: bool,
}

impl Default for ValidationDefaults {
    fn default() -> Self {
        Self { published: true }
    }
}

/// Pick the slug for a payload: the explicit slug if it has one, otherwise
/// the normalized title.
///
/// # Example
///
/// ```rust
/// use gazette_content::{derive_slug, EntryPayload};
/// use serde_json::json;
///
/// let payload = EntryPayload { title: Some(json!("Hi There")), slug: Some(json!("")), ..Default::default() };
/// assert_eq!(derive_slug(&payload), "hi-there");
/// ```
pub fn derive_slug(payload: &EntryPayload) -> String {
    match required_text(&payload.slug) {
        Some(slug) => slug,
        None => optional_text(&payload.title)
            .map(|title| normalize_slug(&title))
            .unwrap_or_default(),
    }
}

/// Validate a payload into a normalized entry.
///
/// The slug must already be present (see [`derive_slug`]); this only checks
/// its shape.
///
/// # Errors
///
/// Returns [`Error::Validation`] with every issue found when a required field
/// is missing or malformed.
pub fn validate(
    kind: EntryKind,
    payload: &EntryPayload,
    defaults: ValidationDefaults,
) -> Result<Entry> {
    let mut issues = Vec::new();

    let title = required_text(&payload.title);
    if title.is_none() {
        issues.push(ValidationIssue::new("title", "Title is required"));
    }

    let slug = required_text(&payload.slug);
    match &slug {
        None => issues.push(ValidationIssue::new("slug", "Slug is required")),
        Some(slug) if !is_valid_slug(slug) => {
            issues.push(ValidationIssue::new("slug", SLUG_SHAPE_MESSAGE));
        }
        Some(_) => {}
    }

    let body = raw_text(&payload.body).filter(|body| !body.trim().is_empty());
    if body.is_none() {
        issues.push(ValidationIssue::new("body", "Body is required"));
    }

    let (Some(title), Some(slug), Some(body)) = (title, slug, body) else {
        return Err(Error::validation(issues));
    };
    if !issues.is_empty() {
        return Err(Error::validation(issues));
    }

    let event_field = |value: &Option<Value>| {
        kind.has_event_fields()
            .then(|| optional_text(value).unwrap_or_default())
    };

    let meta = EntryMeta {
        title,
        excerpt: optional_text(&payload.excerpt).unwrap_or_default(),
        date: optional_text(&payload.date).unwrap_or_default(),
        image: optional_text(&payload.image).unwrap_or_default(),
        tags: coerce_tags(&payload.tags),
        published: coerce_published(&payload.published, defaults.published),
        location: event_field(&payload.location),
        starts_at: event_field(&payload.starts_at),
        ends_at: event_field(&payload.ends_at),
        ..Default::default()
    };

    Ok(Entry::new(kind, slug, meta, body))
}

/// Coerce a tags value: a list of strings or a comma-delimited string.
/// Anything else yields no tags.
pub fn coerce_tags(value: &Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => clean_tags(items.iter().filter_map(scalar_text)),
        Some(Value::String(s)) => split_tag_list(s),
        Some(other) => {
            log::debug!("Ignoring tags value of unexpected shape: {other}");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Coerce a `published` value, falling back to `default` when absent or
/// unrecognized.
pub fn coerce_published(value: &Option<Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => parse_flag(s).unwrap_or(default),
        Some(Value::Number(n)) => n.as_f64().map(flag_from_number).unwrap_or(default),
        _ => default,
    }
}

/// Text of a scalar JSON value without trimming.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn raw_text(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(scalar_text)
}

/// Trimmed text, `None` when absent or not a scalar.
fn optional_text(value: &Option<Value>) -> Option<String> {
    raw_text(value).map(|s| s.trim().to_string())
}

/// Trimmed text, `None` when absent, not a scalar, or blank.
fn required_text(value: &Option<Value>) -> Option<String> {
    optional_text(value).filter(|s| !s.is_empty())
}
