//! Safe extraction of text values from loosely-typed parsed fields.

/// Returns the trimmed value, or `fallback` when the value is absent or blank.
///
/// # Example
///
/// ```
/// use timetable_core::text::extract_text;
///
/// assert_eq!(extract_text(Some("  Lecture  "), "Untitled Event"), "Lecture");
/// assert_eq!(extract_text(Some("   "), "Untitled Event"), "Untitled Event");
/// assert_eq!(extract_text(None, ""), "");
/// ```
pub fn extract_text(raw: Option<&str>, fallback: &str) -> String {
    extract_text_or_else(raw, || fallback.to_string())
}

/// Like [`extract_text`], but only builds the fallback when it is needed.
pub fn extract_text_or_else<F>(raw: Option<&str>, fallback: F) -> String
where
    F: FnOnce() -> String,
{
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback(),
    }
}
