//! Markdown files with YAML front matter.
//!
//! Every entry is persisted as a front-matter block delimited by `---` lines,
//! a blank line, and the raw body:
//!
//! ```markdown
//! ---
//! title: "Spring Fair"
//! excerpt: ""
//! date: "2025-04-12"
//! image: ""
//! tags:
//!   - "community"
//! published: true
//! location: "Town Hall"
//! startsAt: "2025-04-12T10:00"
//! endsAt: ""
//! ---
//!
//! Come along!
//! ```
//!
//! # Escaping
//!
//! [`encode`] writes every string value as a YAML double-quoted scalar.
//! Backslash and double quote are backslash-escaped; `\n`, `\r` and `\t`
//! use their short escapes; remaining control characters, U+2028/U+2029 and
//! the non-characters YAML refuses to read use `\uXXXX`. Nothing a value
//! contains can end the scalar or the block early, so
//! `decode(encode(x)) == x` holds for every entry.
//!
//! # Usage
//!
//! ```rust
//! use gazette_content::frontmatter::{decode, encode};
//! use gazette_core::EntryMeta;
//!
//! let meta = EntryMeta {
//!     title: "She said \"hi\"".to_string(),
//!     ..Default::default()
//! };
//! let text = encode(&meta, "Body").unwrap();
//! assert!(text.contains(r#"title: "She said \"hi\"""#));
//!
//! let doc = decode(&text).unwrap();
//! assert_eq!(doc.meta, meta);
//! assert_eq!(doc.body, "Body");
//! ```

use std::fmt::Write as _;

use gazette_core::util::flags::{flag_from_number, parse_flag};
use gazette_core::{Entry, EntryKind, EntryMeta, Error, Result};
use serde_yaml::{Mapping, Value};

use crate::tags::{clean_tags, split_tag_list};

/// Front-matter delimiter line.
const DELIMITER: &str = "---";

/// Location reported in errors when decoding text with no storage key.
const UNKNOWN_LOCATION: &str = "<document>";

/// Keys written by [`encode`]; extras with these names are never emitted.
const KNOWN_KEYS: [&str; 10] = [
    "title",
    "excerpt",
    "date",
    "image",
    "tags",
    "published",
    "status",
    "location",
    "startsAt",
    "endsAt",
];

/// A decoded document: metadata plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Parsed front-matter metadata.
    pub meta: EntryMeta,
    /// Body text after the front matter.
    pub body: String,
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode metadata and body into the persisted text form.
///
/// Fields are written in a fixed order for readable diffs: title, excerpt,
/// date, image, tags, published, the event fields when present, then unknown
/// keys sorted by name. Order carries no meaning on read.
pub fn encode(meta: &EntryMeta, body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(DELIMITER);
    out.push('\n');

    push_string(&mut out, "title", &meta.title);
    push_string(&mut out, "excerpt", &meta.excerpt);
    push_string(&mut out, "date", &meta.date);
    push_string(&mut out, "image", &meta.image);

    if meta.tags.is_empty() {
        out.push_str("tags: []\n");
    } else {
        out.push_str("tags:\n");
        for tag in &meta.tags {
            out.push_str("  - ");
            out.push_str(&quote(tag));
            out.push('\n');
        }
    }

    out.push_str(if meta.published {
        "published: true\n"
    } else {
        "published: false\n"
    });

    if let Some(location) = &meta.location {
        push_string(&mut out, "location", location);
    }
    if let Some(starts_at) = &meta.starts_at {
        push_string(&mut out, "startsAt", starts_at);
    }
    if let Some(ends_at) = &meta.ends_at {
        push_string(&mut out, "endsAt", ends_at);
    }

    for (key, value) in &meta.extra {
        if KNOWN_KEYS.contains(&key.as_str()) {
            log::warn!("Skipping extra front-matter key '{key}' that shadows a known field");
            continue;
        }
        out.push_str(&encode_extra(key, value)?);
    }

    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    Ok(out)
}

/// Encode an entry. The slug is the storage key, so it is not written.
pub fn encode_entry(entry: &Entry) -> Result<String> {
    encode(&entry.meta, &entry.body)
}

fn push_string(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&quote(value));
    out.push('\n');
}

fn encode_extra(key: &str, value: &Value) -> Result<String> {
    let mut single = Mapping::new();
    single.insert(Value::String(key.to_string()), value.clone());
    let yaml = serde_yaml::to_string(&single)
        .map_err(|e| Error::malformed(key, format!("Cannot encode front-matter value: {e}")))?;
    Ok(if yaml.ends_with('\n') {
        yaml
    } else {
        format!("{yaml}\n")
    })
}

/// Quote a string as a YAML double-quoted scalar.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_unicode_escape(c) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn needs_unicode_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}')
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode persisted text into metadata and body.
///
/// # Errors
///
/// Returns [`Error::MalformedContent`] when the opening or closing `---` line
/// is missing, the block is not valid YAML, or it is not a key/value mapping.
pub fn decode(text: &str) -> Result<Document> {
    decode_at(UNKNOWN_LOCATION, text)
}

/// Decode text read from `location`, which is reported in errors.
pub fn decode_at(location: &str, text: &str) -> Result<Document> {
    let (yaml, body) =
        split_frontmatter(text).map_err(|reason| Error::malformed(location, reason))?;

    let mapping = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(Value::Null) => Mapping::new(),
            Ok(_) => {
                return Err(Error::malformed(
                    location,
                    "Front matter must be a mapping of keys to values",
                ));
            }
            Err(e) => {
                return Err(Error::malformed(
                    location,
                    format!("Invalid front matter YAML: {e}"),
                ));
            }
        }
    };

    Ok(Document {
        meta: meta_from_mapping(location, mapping)?,
        body: body.to_string(),
    })
}

/// Decode the stored text of `(kind, slug)` into an entry.
pub fn decode_entry(kind: EntryKind, slug: &str, text: &str) -> Result<Entry> {
    let Document { mut meta, body } = decode_at(&kind.relative_path(slug), text)?;
    if kind.has_event_fields() {
        for field in [&mut meta.location, &mut meta.starts_at, &mut meta.ends_at] {
            field.get_or_insert_with(String::new);
        }
    }
    Ok(Entry::new(kind, slug, meta, body))
}

/// Split text into the raw YAML block and the body.
///
/// Consumes one blank line after the closing delimiter. Accepts CRLF line
/// endings and a leading byte-order mark.
fn split_frontmatter(text: &str) -> std::result::Result<(&str, &str), &'static str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().ok_or("Document is empty")?;
    if trim_eol(first) != DELIMITER {
        return Err("Missing opening front matter delimiter");
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if trim_eol(line) == DELIMITER {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err("Missing closing front matter delimiter")
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn meta_from_mapping(location: &str, mapping: Mapping) -> Result<EntryMeta> {
    let mut meta = EntryMeta::default();
    let mut published = None;
    let mut status = None;

    for (key, value) in mapping {
        let key = match key {
            Value::String(key) => key,
            other => {
                return Err(Error::malformed(
                    location,
                    format!("Front matter keys must be strings, found {other:?}"),
                ));
            }
        };

        match key.as_str() {
            "title" => meta.title = scalar_text(location, &key, value)?,
            "excerpt" => meta.excerpt = scalar_text(location, &key, value)?,
            "date" => meta.date = scalar_text(location, &key, value)?,
            "image" => meta.image = scalar_text(location, &key, value)?,
            "tags" => meta.tags = tags_from_value(location, value)?,
            "published" => published = flag_from_value(&value),
            "status" => status = Some(scalar_text(location, &key, value)?),
            "location" => meta.location = Some(scalar_text(location, &key, value)?),
            "startsAt" => meta.starts_at = Some(scalar_text(location, &key, value)?),
            "endsAt" => meta.ends_at = Some(scalar_text(location, &key, value)?),
            _ => {
                meta.extra.insert(key, value);
            }
        }
    }

    // Older files carry `status: draft` instead of a boolean.
    meta.published = published
        .or_else(|| status.map(|s| !s.trim().eq_ignore_ascii_case("draft")))
        .unwrap_or(true);

    Ok(meta)
}

fn scalar_text(location: &str, key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Tagged(tagged) => scalar_text(location, key, tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(Error::malformed(
            location,
            format!("Front matter field '{key}' must be a single value"),
        )),
    }
}

fn tags_from_value(location: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::Sequence(items) => {
            let items = items
                .into_iter()
                .map(|item| scalar_text(location, "tags", item))
                .collect::<Result<Vec<_>>>()?;
            Ok(clean_tags(items))
        }
        Value::String(s) => Ok(split_tag_list(&s)),
        Value::Null => Ok(Vec::new()),
        _ => Err(Error::malformed(
            location,
            "Front matter field 'tags' must be a list",
        )),
    }
}

fn flag_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_flag(s),
        Value::Number(n) => n.as_f64().map(flag_from_number),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
