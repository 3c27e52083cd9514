//! SQLite persistence for timetable events.
//!
//! Feed imports replace every feed event atomically; manual events are
//! never touched by an import.

pub mod error;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{EventStore, ImportSummary, SharedStore};
