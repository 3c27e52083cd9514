//! Feed fetching and iCalendar parsing.
//!
//! ```text
//!   feed URL
//!      │
//!      ▼ FeedFetcher::fetch_calendar_text()
//!   calendar text
//!      │
//!      ▼ parse_calendar()
//!   Vec<CanonicalEvent>  (sorted by start; Err only if nothing decodes)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use timetable_feed::{FeedFetcher, FetchConfig, parse_calendar};
//!
//! let fetcher = FeedFetcher::new(FetchConfig::default())?;
//! let text = fetcher.fetch_calendar_text("https://example.com/timetable.ics").await?;
//! let events = parse_calendar(&text)?;
//! ```

pub mod error;
pub mod fetch;
pub mod ics;

pub use error::{FeedError, FeedErrorCode, FeedResult};
pub use fetch::{CALENDAR_MARKER, FeedFetcher, FetchConfig, validate_url};
pub use ics::{DEFAULT_FEED_TITLE, parse_calendar, parse_calendar_in};
