//! Request and response bodies for the timetable HTTP API.
//!
//! All field names are camelCase on the wire.
//!
//! | Route                      | Request               | Response           |
//! |----------------------------|-----------------------|--------------------|
//! | `GET /api/events`          |                       | [`EventsResponse`] |
//! | `POST /api/import/ical`    | [`ImportRequest`]     | [`ImportResponse`] |
//! | `POST /api/events/manual`  | [`ManualEventRequest`]| [`EventsResponse`] |
//! | `GET /api/health`          |                       | [`HealthResponse`] |
//!
//! Failures answer with an [`ErrorResponse`].
//!
//! # Example
//!
//! ```rust
//! use timetable_protocol::ImportRequest;
//!
//! let request: ImportRequest =
//!     serde_json::from_str(r#"{"url":"https://example.com/a.ics"}"#).unwrap();
//! assert_eq!(request.url, "https://example.com/a.ics");
//! ```

mod types;

pub use types::{
    ErrorResponse, EventsResponse, HealthResponse, ImportRequest, ImportResponse,
    ManualEventRequest,
};
