//! Manual event builder.
//!
//! Converts user-supplied date and time strings into a [`CanonicalEvent`].
//! Accepted formats:
//! - date: `YYYY-MM-DD` or `DD/MM/YYYY`, year 1970 or later
//! - time: `HH:MM`, 24-hour

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};
use crate::event::CanonicalEvent;
use crate::time::resolve_local;

/// Title used when the user leaves it blank.
pub const DEFAULT_MANUAL_TITLE: &str = "Manual Entry";

/// Description attached to every manual event.
pub const MANUAL_DESCRIPTION: &str = "Created manually";

static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("Invalid ISO date regex")
});

static UK_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("Invalid UK date regex")
});

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2})$").expect("Invalid time regex"));

/// Raw user input for a manual event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEventInput {
    #[serde(default)]
    pub title: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl ManualEventInput {
    /// Creates an input without a title.
    pub fn new(
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            title: None,
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Builds a manual event, interpreting the wall-clock input in `tz`.
pub fn build_manual_event<Tz: TimeZone>(
    input: &ManualEventInput,
    tz: &Tz,
) -> ValidationResult<CanonicalEvent> {
    let title = match input.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => DEFAULT_MANUAL_TITLE.to_string(),
    };

    let date = parse_date(&input.date).ok_or(ValidationError::InvalidDate)?;

    let (start_time, end_time) = match (parse_time(&input.start_time), parse_time(&input.end_time))
    {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::InvalidTime),
    };

    let start = resolve_local(tz, &date.and_time(start_time)).ok_or(ValidationError::InvalidTime)?;
    let end = resolve_local(tz, &date.and_time(end_time)).ok_or(ValidationError::InvalidTime)?;

    if end <= start {
        return Err(ValidationError::InvalidRange);
    }

    Ok(
        CanonicalEvent::manual(format!("manual-{}", Uuid::new_v4()), title, start, end)
            .with_description(MANUAL_DESCRIPTION),
    )
}

/// Builds a manual event in the server's local timezone.
pub fn build_manual_event_local(input: &ManualEventInput) -> ValidationResult<CanonicalEvent> {
    build_manual_event(input, &Local)
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY` into a real calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    let (year, month, day) = if let Some(caps) = ISO_DATE_REGEX.captures(value) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) = UK_DATE_REGEX.captures(value) {
        (caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
    } else {
        return None;
    };

    valid_date(year, month, day)
}

/// Parses `HH:MM` with hours in 0..=23 and minutes in 0..=59.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let caps = TIME_REGEX.captures(value.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;

    if hours > 23 || minutes > 59 {
        return None;
    }

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

fn valid_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if year < 1970 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    (date.year() == year && date.month() == month && date.day() == day).then_some(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceType;
    use chrono::{FixedOffset, Utc};

    fn build(date: &str, start: &str, end: &str) -> ValidationResult<CanonicalEvent> {
        build_manual_event(&ManualEventInput::new(date, start, end), &Utc)
    }

    #[test]
    fn accepts_both_date_formats() {
        let uk = build("29/02/2024", "09:00", "10:00").unwrap();
        let iso = build("2024-02-29", "09:00", "10:00").unwrap();

        assert_eq!(uk.start, iso.start);
        assert_eq!(
            uk.start,
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
        assert_eq!(uk.end, Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap());
    }

    #[test]
    fn rejects_impossible_dates() {
        for date in [
            "31/02/2024",
            "29/02/2023",
            "31/04/2024",
            "2024-13-01",
            "2024-00-10",
            "00/01/2024",
            "01/01/1969",
            "2024/02/01",
            "1/2/2024",
            "",
            "tomorrow",
        ] {
            assert_eq!(
                build(date, "09:00", "10:00").unwrap_err(),
                ValidationError::InvalidDate,
                "date {date:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_times() {
        for (start, end) in [
            ("24:00", "10:00"),
            ("09:60", "10:00"),
            ("9:00", "10:00"),
            ("09:00", "10"),
            ("09:00", ""),
            ("0900", "1000"),
        ] {
            assert_eq!(
                build("2024-05-01", start, end).unwrap_err(),
                ValidationError::InvalidTime,
                "times {start:?}-{end:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_increasing_range() {
        assert_eq!(
            build("2024-05-01", "10:00", "09:00").unwrap_err(),
            ValidationError::InvalidRange
        );
        assert_eq!(
            build("2024-05-01", "10:00", "10:00").unwrap_err(),
            ValidationError::InvalidRange
        );
    }

    #[test]
    fn date_is_checked_before_times() {
        assert_eq!(
            build("31/02/2024", "xx", "10:00").unwrap_err(),
            ValidationError::InvalidDate
        );
    }

    #[test]
    fn fills_manual_defaults() {
        let event = build(" 2024-05-01 ", " 09:00", "10:30 ").unwrap();

        assert_eq!(event.title, DEFAULT_MANUAL_TITLE);
        assert_eq!(event.description, MANUAL_DESCRIPTION);
        assert_eq!(event.location, "");
        assert_eq!(event.source_type, SourceType::Manual);
        assert!(event.import_id.is_none());
        assert!(!event.is_cancelled);
        assert!(event.uid.starts_with("manual-"));
    }

    #[test]
    fn keeps_trimmed_title_and_generates_unique_uids() {
        let input = ManualEventInput::new("2024-05-01", "09:00", "10:00").with_title("  Gym  ");
        let first = build_manual_event(&input, &Utc).unwrap();
        let second = build_manual_event(&input, &Utc).unwrap();

        assert_eq!(first.title, "Gym");
        assert_ne!(first.uid, second.uid);

        let blank = ManualEventInput::new("2024-05-01", "09:00", "10:00").with_title("   ");
        assert_eq!(
            build_manual_event(&blank, &Utc).unwrap().title,
            DEFAULT_MANUAL_TITLE
        );
    }

    #[test]
    fn interprets_wall_clock_in_timezone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let input = ManualEventInput::new("01/06/2024", "09:00", "10:00");
        let event = build_manual_event(&input, &tz).unwrap();

        assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn input_deserializes_camel_case() {
        let input: ManualEventInput = serde_json::from_str(
            r#"{"date":"2024-05-01","startTime":"09:00","endTime":"10:00"}"#,
        )
        .unwrap();

        assert!(input.title.is_none());
        assert_eq!(input.start_time, "09:00");
        assert_eq!(input.end_time, "10:00");
    }
}
