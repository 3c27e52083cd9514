//! Core types: canonical events, text normalization, cancellation detection,
//! manual entry, display labels and tracing setup.

pub mod cancel;
pub mod error;
pub mod event;
pub mod manual;
pub mod text;
pub mod time;
pub mod tracing;

pub use cancel::is_cancelled;
pub use error::{ValidationError, ValidationResult};
pub use event::{CanonicalEvent, DisplayEvent, Import, SourceType, StoredEvent};
pub use manual::{ManualEventInput, build_manual_event, build_manual_event_local};
pub use text::{extract_text, extract_text_or_else};
pub use time::{parse_instant, to_storage_string};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
