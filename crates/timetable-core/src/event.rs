//! Event types for the timetable.
//!
//! This module provides the core records shared by every crate:
//! - [`CanonicalEvent`]: the normalized, storage-ready event shape
//! - [`SourceType`]: where an event came from (feed import or manual entry)
//! - [`Import`]: provenance of one fetch-parse-replace operation
//! - [`StoredEvent`]: a persisted event with its row metadata
//! - [`DisplayEvent`]: a stored event augmented with display labels

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{date_label, parse_instant, time_label};

/// The origin of an event. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Imported from a remote iCal feed.
    #[serde(rename = "ical")]
    Feed,
    /// Entered by hand.
    #[serde(rename = "manual")]
    Manual,
}

impl SourceType {
    /// Returns the persisted/transport name of this source type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "ical",
            Self::Manual => "manual",
        }
    }

    /// Parses a persisted source type name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ical" => Some(Self::Feed),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized calendar event, either feed-derived or manually entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    /// Identifier from the source calendar, or generated for manual events.
    pub uid: String,
    /// Display title, never empty.
    pub title: String,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant. Equal to `start` when a feed omits it.
    pub end: DateTime<Utc>,
    /// Location, possibly empty.
    pub location: String,
    /// Description, possibly empty.
    pub description: String,
    /// Whether the event is cancelled. Derived once at parse time.
    pub is_cancelled: bool,
    /// Where the event came from.
    pub source_type: SourceType,
    /// The import that produced this event (feed events only).
    pub import_id: Option<i64>,
}

impl CanonicalEvent {
    /// Creates a feed-sourced event with empty location/description.
    ///
    /// The import id is assigned later, when the event is persisted.
    pub fn feed(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            start,
            end,
            location: String::new(),
            description: String::new(),
            is_cancelled: false,
            source_type: SourceType::Feed,
            import_id: None,
        }
    }

    /// Creates a manually entered event.
    pub fn manual(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            source_type: SourceType::Manual,
            ..Self::feed(uid, title, start, end)
        }
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the cancellation flag.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.is_cancelled = cancelled;
        self
    }
}

/// Provenance record of one fetch-and-parse operation against a feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// Identifier assigned by the store.
    pub id: i64,
    /// The URL that was fetched.
    pub source_url: String,
    /// When the import ran.
    pub imported_at: DateTime<Utc>,
}

/// An event as persisted, with its row id.
///
/// Instants are kept in their stored text form so a corrupted row can still
/// be listed; [`StoredEvent::start`] parses on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// Insertion id, used to break start-time ties.
    pub id: i64,
    pub import_id: Option<i64>,
    pub source_type: SourceType,
    pub uid: Option<String>,
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    pub location: String,
    pub description: String,
    pub is_cancelled: bool,
}

impl StoredEvent {
    /// Parses the stored start instant.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start_iso)
    }

    /// Parses the stored end instant.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.end_iso)
    }
}

/// A display-ready event: the stored record plus date/time labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
    pub id: i64,
    pub import_id: Option<i64>,
    pub source_type: SourceType,
    pub uid: Option<String>,
    pub title: String,
    pub start_iso: String,
    pub end_iso: String,
    pub location: String,
    pub description: String,
    pub is_cancelled: bool,
    /// Start date as `dd/mm/yyyy`, or `"Invalid Date"`.
    pub date_label: String,
    /// Start time as 24-hour `HH:MM`, or `"Invalid Time"`.
    pub time_label: String,
}

impl DisplayEvent {
    /// Builds a display event, formatting labels in the given timezone.
    pub fn from_stored<Tz>(event: &StoredEvent, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let start = event.start();

        Self {
            id: event.id,
            import_id: event.import_id,
            source_type: event.source_type,
            uid: event.uid.clone(),
            title: event.title.clone(),
            start_iso: event.start_iso.clone(),
            end_iso: event.end_iso.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            is_cancelled: event.is_cancelled,
            date_label: date_label(start.as_ref(), tz),
            time_label: time_label(start.as_ref(), tz),
        }
    }
}
