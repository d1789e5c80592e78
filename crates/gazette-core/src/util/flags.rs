//! Boolean flag parsing.
//!
//! Editors and form posts send booleans in many shapes. The JSON validator
//! and the YAML codec both funnel their string forms through [`parse_flag`].

/// Parse a string form of a boolean.
///
/// Recognizes `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitively and
/// ignoring surrounding whitespace. Returns `None` for anything else so the
/// caller can apply its own default.
///
/// # Examples
///
/// ```
/// use gazette_core::util::flags::parse_flag;
///
/// assert_eq!(parse_flag("Yes"), Some(true));
/// assert_eq!(parse_flag(" 0 "), Some(false));
/// assert_eq!(parse_flag("maybe"), None);
/// ```
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Interpret a number as a flag: zero is false, anything else true.
pub fn flag_from_number(value: f64) -> bool {
    value != 0.0
}
