//! The ingestion pipeline behind the HTTP routes.
//!
//! ```text
//!   import:  validate url ─► fetch ─► parse ─► replace feed events ─► list
//!   manual:  validate input ─► insert ─► list
//! ```
//!
//! Fetching is the only step that awaits the network. Database work runs on
//! the blocking pool while holding the store lock.

use chrono::Local;
use tracing::{debug, info};

use timetable_core::{DisplayEvent, Import, ManualEventInput, build_manual_event_local};
use timetable_feed::{FeedFetcher, parse_calendar};
use timetable_store::{EventStore, ImportSummary, SharedStore, StoreResult};

use crate::error::{ServerError, ServerResult};

/// Outcome of [`ImportService::import_feed`].
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub summary: ImportSummary,
    /// The whole timetable after the import.
    pub events: Vec<DisplayEvent>,
}

#[derive(Clone)]
pub struct ImportService {
    store: SharedStore,
    fetcher: FeedFetcher,
}

impl ImportService {
    pub fn new(store: SharedStore, fetcher: FeedFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Fetches `url`, replaces all feed events with its VEVENTs and returns
    /// the refreshed timetable.
    ///
    /// Fetch and parse errors leave the store untouched, and a failed save is
    /// rolled back; all three are reported as a failed import. The URL is
    /// recorded trimmed.
    pub async fn import_feed(&self, url: &str) -> ServerResult<ImportOutcome> {
        let source_url = url.trim().to_string();
        let text = self.fetcher.fetch_calendar_text(&source_url).await?;
        let events = parse_calendar(&text)?;
        debug!(url = %source_url, parsed = events.len(), "Parsed feed");

        let (summary, events) = self
            .with_store(move |store| {
                let summary = store.import_feed(&source_url, &events)?;
                Ok((summary, store.list_display(&Local)?))
            })
            .await
            .map_err(ServerError::into_import)?;

        info!(
            import_id = summary.import_id,
            imported = summary.imported_count,
            total = events.len(),
            "Feed import complete"
        );

        Ok(ImportOutcome { summary, events })
    }

    /// Validates and stores a manual event, then returns the refreshed
    /// timetable.
    pub async fn add_manual(&self, input: ManualEventInput) -> ServerResult<Vec<DisplayEvent>> {
        let event = build_manual_event_local(&input)?;

        self.with_store(move |store| {
            store.insert_manual(&event)?;
            store.list_display(&Local)
        })
        .await
    }

    pub async fn list_events(&self) -> ServerResult<Vec<DisplayEvent>> {
        self.with_store(|store| store.list_display(&Local)).await
    }

    pub async fn list_imports(&self) -> ServerResult<Vec<Import>> {
        self.with_store(|store| store.list_imports()).await
    }

    async fn with_store<T, F>(&self, f: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut EventStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || store.with(f)).await??;
        Ok(result)
    }
}
