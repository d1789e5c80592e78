//! Slug normalization utilities.
//!
//! A slug is the URL-safe primary key of an entry within its kind and the
//! stem of its file name. Slugs match `[a-z0-9]+(-[a-z0-9]+)*`.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("Invalid disallowed-chars regex"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("Invalid separator regex"));

static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid slug regex"));

/// Normalize free-form text (usually a title) into a slug.
///
/// Performs the following transformations:
/// 1. Converts to lowercase
/// 2. Drops every character outside `[a-z0-9]`, whitespace, and `-`
/// 3. Collapses runs of whitespace and hyphens into a single hyphen
/// 4. Trims leading/trailing hyphens
///
/// Never fails. Empty (or all-punctuation) input yields an empty string,
/// which callers must reject separately.
///
/// # Examples
///
/// ```
/// use gazette_core::util::slug::normalize_slug;
///
/// assert_eq!(normalize_slug("Hi There"), "hi-there");
/// assert_eq!(normalize_slug("  Rock & Roll -- Live!  "), "rock-roll-live");
/// assert_eq!(normalize_slug("Café au lait"), "caf-au-lait");
/// assert_eq!(normalize_slug("???"), "");
/// ```
pub fn normalize_slug(input: &str) -> String {
    let lowered = input.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = SEPARATORS.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Check that a string already has canonical slug shape.
///
/// # Examples
///
/// ```
/// use gazette_core::util::slug::is_valid_slug;
///
/// assert!(is_valid_slug("hello-world-2024"));
/// assert!(!is_valid_slug("Hello"));
/// assert!(!is_valid_slug("double--hyphen"));
/// assert!(!is_valid_slug(""));
/// ```
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_SHAPE.is_match(slug)
}
