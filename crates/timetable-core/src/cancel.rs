//! Cancellation detection.
//!
//! Some feeds mark cancelled sessions with a structured `STATUS:CANCELLED`,
//! others only annotate the title or description. All the matching rules live
//! behind [`is_cancelled`].

use std::sync::LazyLock;

use regex::Regex;

/// Bracketed marker in a title, e.g. `Lecture [Cancelled]`.
static TITLE_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[CANCELLED\]").expect("Invalid title marker regex"));

/// Free-text annotation in a description, e.g. `Type: CANCELLED`.
static DESCRIPTION_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Type:\s*CANCELLED").expect("Invalid description marker regex")
});

/// Returns true if an event should be treated as cancelled.
///
/// # Example
///
/// ```
/// use timetable_core::cancel::is_cancelled;
///
/// assert!(is_cancelled("cancelled", "Seminar", ""));
/// assert!(is_cancelled("", "Lecture [Cancelled]", ""));
/// assert!(is_cancelled("", "Lab", "Type: CANCELLED"));
/// assert!(!is_cancelled("CONFIRMED", "Lab", ""));
/// ```
pub fn is_cancelled(status: &str, title: &str, description: &str) -> bool {
    status.trim().eq_ignore_ascii_case("CANCELLED")
        || TITLE_MARKER_REGEX.is_match(title)
        || DESCRIPTION_MARKER_REGEX.is_match(description)
}
