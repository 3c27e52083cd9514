//! ICS/iCalendar parsing.
//!
//! This module parses iCalendar (RFC 5545) text and converts every usable
//! VEVENT into a [`CanonicalEvent`]. Malformed events are dropped, never
//! reported as errors: one bad VEVENT must not abort a whole import. Only a
//! document in which nothing decodes is an error.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use tracing::{debug, warn};
use uuid::Uuid;

use timetable_core::text::{extract_text, extract_text_or_else};
use timetable_core::time::resolve_local;
use timetable_core::{CanonicalEvent, is_cancelled};

use crate::error::{FeedError, FeedResult};

/// Title used when a VEVENT has no usable SUMMARY.
pub const DEFAULT_FEED_TITLE: &str = "Untitled Event";

const BOM: char = '\u{feff}';

/// Parses calendar text into events sorted by start instant.
///
/// Floating times and all-day dates are interpreted in the server's local
/// timezone; see [`parse_calendar_in`].
pub fn parse_calendar(ics: &str) -> FeedResult<Vec<CanonicalEvent>> {
    parse_calendar_in(ics, &Local)
}

/// Parses calendar text, interpreting floating times and all-day dates in
/// `local`.
///
/// A leading byte order mark is ignored. When the document as a whole does
/// not decode, each VEVENT block is parsed on its own so that one malformed
/// line only costs the event holding it. Fails with
/// [`FeedError::Unparseable`] only if nothing in the text decodes.
///
/// The sort is stable: events sharing a start keep their order of appearance.
pub fn parse_calendar_in<L: TimeZone>(ics: &str, local: &L) -> FeedResult<Vec<CanonicalEvent>> {
    let ics = ics.trim_start_matches(BOM);

    let (mut events, skipped) = match ics.parse::<Calendar>() {
        Ok(calendar) => collect_events(&calendar, local),
        Err(e) => {
            warn!(error = %e, "Failed to parse ICS content, parsing VEVENT blocks separately");
            parse_blocks(ics, local).ok_or_else(|| FeedError::Unparseable {
                reason: e.to_string(),
            })?
        }
    };

    events.sort_by_key(|event| event.start);

    debug!(
        accepted = events.len(),
        skipped, "Parsed events from ICS"
    );

    Ok(events)
}

fn collect_events<L: TimeZone>(calendar: &Calendar, local: &L) -> (Vec<CanonicalEvent>, usize) {
    let mut skipped = 0usize;
    let events = calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => {
                let parsed = parse_event(event, local);
                if parsed.is_none() {
                    skipped += 1;
                }
                parsed
            }
            _ => None,
        })
        .collect();
    (events, skipped)
}

/// Parses every `BEGIN:VEVENT`..`END:VEVENT` block as a calendar of its own.
///
/// A block that fails is retried without its stray lines (neither a
/// `NAME:value` line nor a folded continuation). Returns `None` when no block
/// decodes at all.
fn parse_blocks<L: TimeZone>(ics: &str, local: &L) -> Option<(Vec<CanonicalEvent>, usize)> {
    let blocks = vevent_blocks(ics);
    let mut decoded = 0usize;
    let mut skipped = 0usize;
    let mut events = Vec::new();

    for block in &blocks {
        let calendar = match parse_block(block) {
            Some(calendar) => calendar,
            None => {
                let kept: Vec<&str> = block
                    .iter()
                    .copied()
                    .filter(|line| is_content_line(line))
                    .collect();
                match parse_block(&kept) {
                    Some(calendar) => calendar,
                    None => {
                        skipped += 1;
                        continue;
                    }
                }
            }
        };

        decoded += 1;
        let (parsed, dropped) = collect_events(&calendar, local);
        events.extend(parsed);
        skipped += dropped;
    }

    debug!(blocks = blocks.len(), decoded, "Parsed VEVENT blocks separately");

    (decoded > 0).then_some((events, skipped))
}

fn vevent_blocks(ics: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in ics.lines() {
        let marker = line.trim();
        if marker.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(vec![line]);
        } else if let Some(block) = current.as_mut() {
            block.push(line);
            if marker.eq_ignore_ascii_case("END:VEVENT") {
                blocks.extend(current.take());
            }
        }
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Option<Calendar> {
    let ics = format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//timetable//block//EN\r\n{}\r\nEND:VCALENDAR\r\n",
        lines.join("\r\n")
    );
    ics.parse::<Calendar>().ok()
}

fn is_content_line(line: &str) -> bool {
    line.starts_with([' ', '\t']) || line.contains(':')
}

/// Parses a single VEVENT. Returns `None` when it has no valid start.
fn parse_event<L: TimeZone>(event: &Event, local: &L) -> Option<CanonicalEvent> {
    let Some(start) = event.get_start().and_then(|dt| to_instant(dt, local)) else {
        debug!(
            uid = ?event.get_uid(),
            "Skipping VEVENT without a valid DTSTART"
        );
        return None;
    };

    let end = event
        .get_end()
        .and_then(|dt| to_instant(dt, local))
        .unwrap_or(start);

    let title = extract_text(event.get_summary(), DEFAULT_FEED_TITLE);
    let description = extract_text(event.get_description(), "");
    let location = extract_text(event.get_location(), "");
    let status = extract_text(event.property_value("STATUS"), "");
    let uid = extract_text_or_else(event.get_uid(), || Uuid::new_v4().to_string());

    let cancelled = is_cancelled(&status, &title, &description);

    Some(
        CanonicalEvent::feed(uid, title, start, end)
            .with_location(location)
            .with_description(description)
            .with_cancelled(cancelled),
    )
}

/// Converts an iCalendar date or date-time to an instant.
///
/// - `…Z` values are UTC
/// - `TZID=` values use the named zone, or UTC if the name is unknown
/// - floating values and all-day dates use `local`
fn to_instant<L: TimeZone>(value: DatePerhapsTime, local: &L) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::Date(date) => resolve_local(local, &date.and_hms_opt(0, 0, 0)?),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            resolve_local(local, &naive)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            resolve_with_tzid(&date_time, &tzid)
        }
    }
}

fn resolve_with_tzid(date_time: &NaiveDateTime, tzid: &str) -> Option<DateTime<Utc>> {
    match tzid.trim().parse::<Tz>() {
        Ok(tz) => resolve_local(&tz, date_time),
        Err(_) => {
            debug!(tzid = %tzid, "Unknown TZID, assuming UTC");
            Some(Utc.from_utc_datetime(date_time))
        }
    }
}
