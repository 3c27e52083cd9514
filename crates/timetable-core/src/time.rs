//! Instant helpers shared by the parser, the store and the display layer.
//!
//! Instants are persisted as RFC 3339 text with millisecond precision and a
//! `Z` suffix, so that lexical order equals chronological order.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Label used when a stored start instant cannot be parsed.
pub const INVALID_DATE_LABEL: &str = "Invalid Date";

/// Label used when a stored start instant cannot be parsed.
pub const INVALID_TIME_LABEL: &str = "Invalid Time";

/// Formats an instant for storage, e.g. `2025-02-05T10:00:00.000Z`.
pub fn to_storage_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored RFC 3339 instant.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Resolves a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fold) take the earliest instant; non-existent times
/// (DST gap) return `None`.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats the date part of `start` in `tz` as `dd/mm/yyyy`.
pub fn date_label<Tz>(start: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match start {
        Some(dt) => dt.with_timezone(tz).format("%d/%m/%Y").to_string(),
        None => INVALID_DATE_LABEL.to_string(),
    }
}

/// Formats the time part of `start` in `tz` as 24-hour `HH:MM`.
pub fn time_label<Tz>(start: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match start {
        Some(dt) => dt.with_timezone(tz).format("%H:%M").to_string(),
        None => INVALID_TIME_LABEL.to_string(),
    }
}
