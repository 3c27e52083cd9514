//! Wire types for the timetable API.

use serde::{Deserialize, Serialize};
use timetable_core::{DisplayEvent, ManualEventInput};

/// Body of `POST /api/events/manual`.
///
/// `title` may be omitted; the date and times are validated server side.
pub type ManualEventRequest = ManualEventInput;

/// Body of `POST /api/import/ical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Feed URL. Surrounding whitespace is ignored.
    pub url: String,
}

impl ImportRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// The full timetable, both sources, ordered by start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsResponse {
    pub count: usize,
    pub events: Vec<DisplayEvent>,
}

impl EventsResponse {
    pub fn new(events: Vec<DisplayEvent>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }
}

/// Result of a feed import plus the refreshed timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub import_id: i64,
    /// Number of events parsed from the feed.
    pub imported_count: usize,
    /// Number of events in the whole timetable after the import.
    pub count: usize,
    pub events: Vec<DisplayEvent>,
}

impl ImportResponse {
    pub fn new(import_id: i64, imported_count: usize, events: Vec<DisplayEvent>) -> Self {
        Self {
            import_id,
            imported_count,
            count: events.len(),
            events,
        }
    }
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
