//! Tag list cleaning.

/// Split a comma-delimited tag string into raw items.
///
/// # Example
///
/// ```rust
/// use gazette_content::tags::split_tag_list;
///
/// assert_eq!(split_tag_list("news, local ,,events"), vec!["news", "local", "events"]);
/// ```
pub fn split_tag_list(input: &str) -> Vec<String> {
    clean_tags(input.split(',').map(String::from))
}

/// Trim every tag, drop empties, and drop repeats while keeping the first
/// occurrence's position.
///
/// Duplicates are detected after trimming and are case-sensitive.
pub fn clean_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || cleaned.iter().any(|seen| seen == tag) {
            continue;
        }
        cleaned.push(tag.to_string());
    }
    cleaned
}
