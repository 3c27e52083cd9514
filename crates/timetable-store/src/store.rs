//! Event repository and import transaction manager.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use rusqlite::{Connection, Row, TransactionBehavior, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use timetable_core::time::{parse_instant, to_storage_string};
use timetable_core::{CanonicalEvent, DisplayEvent, Import, SourceType, StoredEvent};

use crate::error::{StoreError, StoreResult};
use crate::schema;

const INSERT_EVENT_SQL: &str = "INSERT INTO events (import_id, source_type, uid, title, start_iso, end_iso, location, description, is_cancelled, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

const SELECT_EVENTS_SQL: &str = "SELECT id, import_id, source_type, uid, title, start_iso, end_iso, location, description, is_cancelled FROM events ORDER BY start_iso ASC, id ASC";

/// Outcome of a successful feed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub import_id: i64,
    /// Feed events inserted by this import.
    pub imported_count: usize,
    /// Feed events from earlier imports that were replaced.
    pub replaced_count: usize,
}

/// SQLite-backed store for imports and events.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        Ok(Self::new(schema::open_and_migrate(path)?))
    }

    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::new(schema::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replaces every feed event with `events` in one transaction.
    ///
    /// Records a new import, deletes all feed events regardless of the import
    /// that produced them, then inserts `events` tagged with the new import
    /// id. Either all three steps commit or none do. An empty `events` leaves
    /// no feed events behind.
    pub fn import_feed(
        &mut self,
        source_url: &str,
        events: &[CanonicalEvent],
    ) -> StoreResult<ImportSummary> {
        let imported_at = to_storage_string(&Utc::now());
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO imports (source_url, imported_at) VALUES (?1, ?2)",
            params![source_url, imported_at],
        )?;
        let import_id = tx.last_insert_rowid();

        let replaced_count = tx.execute(
            "DELETE FROM events WHERE source_type = ?1",
            [SourceType::Feed.as_str()],
        )?;

        {
            let mut stmt = tx.prepare_cached(INSERT_EVENT_SQL)?;
            for event in events {
                stmt.execute(params![
                    import_id,
                    SourceType::Feed.as_str(),
                    event.uid,
                    event.title,
                    to_storage_string(&event.start),
                    to_storage_string(&event.end),
                    event.location,
                    event.description,
                    event.is_cancelled,
                    imported_at,
                ])?;
            }
        }

        tx.commit()?;

        info!(
            import_id,
            source_url,
            imported = events.len(),
            replaced = replaced_count,
            "Imported feed events"
        );

        Ok(ImportSummary {
            import_id,
            imported_count: events.len(),
            replaced_count,
        })
    }

    /// Persists one manual event and returns its row id.
    pub fn insert_manual(&self, event: &CanonicalEvent) -> StoreResult<i64> {
        let created_at = to_storage_string(&Utc::now());
        self.conn.execute(
            INSERT_EVENT_SQL,
            params![
                Option::<i64>::None,
                SourceType::Manual.as_str(),
                event.uid,
                event.title,
                to_storage_string(&event.start),
                to_storage_string(&event.end),
                event.location,
                event.description,
                event.is_cancelled,
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, uid = %event.uid, "Inserted manual event");
        Ok(id)
    }

    /// Returns every event, both sources, by start ascending then insertion id.
    ///
    /// Rows with a source type this build does not know are logged and left
    /// out.
    pub fn list_all(&self) -> StoreResult<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare_cached(SELECT_EVENTS_SQL)?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.extend(map_event_row(row)?);
        }
        Ok(events)
    }

    /// Like [`EventStore::list_all`], with date/time labels formatted in `tz`.
    pub fn list_display<Tz>(&self, tz: &Tz) -> StoreResult<Vec<DisplayEvent>>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Ok(self
            .list_all()?
            .iter()
            .map(|event| DisplayEvent::from_stored(event, tz))
            .collect())
    }

    /// Returns import provenance records, newest first.
    pub fn list_imports(&self) -> StoreResult<Vec<Import>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, source_url, imported_at FROM imports ORDER BY id DESC")?;
        let mut rows = stmt.query([])?;
        let mut imports = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let imported_at: String = row.get(2)?;
            imports.push(Import {
                id,
                source_url: row.get(1)?,
                imported_at: parse_instant(&imported_at).ok_or_else(|| {
                    StoreError::invalid_row(id, format!("invalid imported_at: {imported_at}"))
                })?,
            });
        }
        Ok(imports)
    }

    /// Deletes an import record. Its events stay, with `import_id` cleared.
    pub fn delete_import(&self, import_id: i64) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM imports WHERE id = ?1", [import_id])?;
        Ok(deleted > 0)
    }
}

fn map_event_row(row: &Row<'_>) -> StoreResult<Option<StoredEvent>> {
    let id: i64 = row.get(0)?;
    let raw_source_type: String = row.get(2)?;
    let Some(source_type) = SourceType::parse(&raw_source_type) else {
        warn!(id, source_type = %raw_source_type, "Skipping event with unknown source type");
        return Ok(None);
    };

    Ok(Some(StoredEvent {
        id,
        import_id: row.get(1)?,
        source_type,
        uid: row.get(3)?,
        title: row.get(4)?,
        start_iso: row.get(5)?,
        end_iso: row.get(6)?,
        location: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        is_cancelled: row.get(9)?,
    }))
}

/// An [`EventStore`] shared between request handlers.
///
/// The import transaction runs while holding the lock, so other handlers
/// observe either the state before an import or the state after it.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<EventStore>>,
}

impl SharedStore {
    pub fn new(store: EventStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Runs `f` with exclusive access to the store.
    ///
    /// Blocking; call from `spawn_blocking` in async code.
    pub fn with<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut EventStore) -> StoreResult<T>,
    {
        let mut guard = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use timetable_core::{ManualEventInput, build_manual_event};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn feed_event(uid: &str, start: DateTime<Utc>) -> CanonicalEvent {
        CanonicalEvent::feed(uid, format!("Event {uid}"), start, start + chrono::Duration::hours(1))
    }

    fn manual_event(date: &str, start: &str, end: &str) -> CanonicalEvent {
        build_manual_event(&ManualEventInput::new(date, start, end), &Utc).unwrap()
    }

    fn uids(events: &[StoredEvent]) -> Vec<String> {
        events.iter().filter_map(|e| e.uid.clone()).collect()
    }

    #[test]
    fn import_inserts_feed_events() {
        let mut store = EventStore::in_memory().unwrap();
        let summary = store
            .import_feed(
                "https://example.com/a.ics",
                &[feed_event("a", utc(2025, 3, 1, 9, 0)).with_cancelled(true)],
            )
            .unwrap();

        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.replaced_count, 0);

        let events = store.list_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].import_id, Some(summary.import_id));
        assert_eq!(events[0].source_type, SourceType::Feed);
        assert_eq!(events[0].start_iso, "2025-03-01T09:00:00.000Z");
        assert_eq!(events[0].end_iso, "2025-03-01T10:00:00.000Z");
        assert!(events[0].is_cancelled);
    }

    #[test]
    fn second_import_replaces_first() {
        let mut store = EventStore::in_memory().unwrap();
        let url = "https://example.com/a.ics";

        let first = store
            .import_feed(
                url,
                &[
                    feed_event("a", utc(2025, 3, 1, 9, 0)),
                    feed_event("b", utc(2025, 3, 2, 9, 0)),
                ],
            )
            .unwrap();
        let second = store
            .import_feed(url, &[feed_event("c", utc(2025, 3, 3, 9, 0))])
            .unwrap();

        assert_ne!(first.import_id, second.import_id);
        assert_eq!(second.replaced_count, 2);

        let events = store.list_all().unwrap();
        assert_eq!(uids(&events), ["c"]);
        assert!(events.iter().all(|e| e.import_id != Some(first.import_id)));
    }

    #[test]
    fn import_replaces_feed_events_from_any_import() {
        let mut store = EventStore::in_memory().unwrap();
        store
            .import_feed("https://a.example/a.ics", &[feed_event("a", utc(2025, 3, 1, 9, 0))])
            .unwrap();
        store
            .import_feed("https://b.example/b.ics", &[feed_event("b", utc(2025, 3, 1, 9, 0))])
            .unwrap();

        assert_eq!(uids(&store.list_all().unwrap()), ["b"]);
        assert_eq!(store.list_imports().unwrap().len(), 2);
    }

    #[test]
    fn empty_import_removes_feed_events_but_keeps_manual() {
        let mut store = EventStore::in_memory().unwrap();
        store
            .import_feed("https://example.com/a.ics", &[feed_event("a", utc(2025, 3, 1, 9, 0))])
            .unwrap();
        let manual = manual_event("2025-03-01", "12:00", "13:00");
        store.insert_manual(&manual).unwrap();

        let summary = store.import_feed("https://example.com/a.ics", &[]).unwrap();
        assert_eq!(summary.imported_count, 0);

        let events = store.list_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_type, SourceType::Manual);
        assert_eq!(events[0].uid.as_deref(), Some(manual.uid.as_str()));
    }

    #[test]
    fn import_forces_feed_source_type() {
        let mut store = EventStore::in_memory().unwrap();
        let disguised = manual_event("2025-03-01", "08:00", "09:00");
        store.import_feed("https://example.com/a.ics", &[disguised]).unwrap();

        let events = store.list_all().unwrap();
        assert_eq!(events[0].source_type, SourceType::Feed);
        assert!(events[0].import_id.is_some());
    }

    #[test]
    fn failed_import_rolls_back_everything() {
        let mut store = EventStore::in_memory().unwrap();
        let url = "https://example.com/a.ics";
        let first = store
            .import_feed(url, &[feed_event("old", utc(2025, 3, 1, 9, 0))])
            .unwrap();

        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON events
                 WHEN NEW.uid = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = store.import_feed(
            url,
            &[
                feed_event("new", utc(2025, 3, 2, 9, 0)),
                feed_event("boom", utc(2025, 3, 3, 9, 0)),
            ],
        );
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        let events = store.list_all().unwrap();
        assert_eq!(uids(&events), ["old"]);
        assert_eq!(events[0].import_id, Some(first.import_id));

        let imports = store.list_imports().unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].id, first.import_id);
    }

    #[test]
    fn manual_events_have_no_import() {
        let store = EventStore::in_memory().unwrap();
        let event = manual_event("29/02/2024", "09:00", "10:00");
        let id = store.insert_manual(&event).unwrap();

        let events = store.list_all().unwrap();
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].import_id, None);
        assert_eq!(events[0].source_type, SourceType::Manual);
        assert_eq!(events[0].title, "Manual Entry");
        assert_eq!(events[0].description, "Created manually");
        assert_eq!(events[0].start(), Some(event.start));
        assert_eq!(events[0].end(), Some(event.end));
    }

    #[test]
    fn list_orders_mixed_sources_by_start_then_id() {
        let mut store = EventStore::in_memory().unwrap();

        store
            .insert_manual(&manual_event("2025-03-02", "09:00", "10:00"))
            .unwrap();
        store
            .import_feed(
                "https://example.com/a.ics",
                &[
                    feed_event("feed-early", utc(2025, 3, 1, 9, 0)),
                    feed_event("feed-tie", utc(2025, 3, 2, 9, 0)),
                    feed_event("feed-late", utc(2025, 3, 4, 9, 0)),
                ],
            )
            .unwrap();
        store
            .insert_manual(&manual_event("2025-03-03", "07:30", "08:00"))
            .unwrap();

        let events = store.list_all().unwrap();
        let starts: Vec<_> = events.iter().map(|e| e.start().unwrap()).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));

        // Same start: the earlier insertion comes first.
        assert_eq!(events[1].source_type, SourceType::Manual);
        assert_eq!(events[2].uid.as_deref(), Some("feed-tie"));
        assert!(events[1].id < events[2].id);
        assert_eq!(events[3].source_type, SourceType::Manual);
        assert_eq!(events[4].uid.as_deref(), Some("feed-late"));
    }

    #[test]
    fn list_all_is_repeatable() {
        let mut store = EventStore::in_memory().unwrap();
        store
            .import_feed(
                "https://example.com/a.ics",
                &[
                    feed_event("a", utc(2025, 3, 1, 9, 0)),
                    feed_event("b", utc(2025, 3, 1, 9, 0)),
                ],
            )
            .unwrap();
        store
            .insert_manual(&manual_event("2025-03-01", "09:00", "10:00"))
            .unwrap();

        assert_eq!(store.list_all().unwrap(), store.list_all().unwrap());
        assert_eq!(
            store.list_display(&Utc).unwrap(),
            store.list_display(&Utc).unwrap()
        );
    }

    #[test]
    fn display_labels_degrade_for_corrupted_start() {
        let store = EventStore::in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO events (source_type, uid, title, start_iso, end_iso, created_at) VALUES ('manual', 'x', 'Broken', 'garbage', 'garbage', 'now')",
                [],
            )
            .unwrap();
        store
            .insert_manual(&manual_event("2025-03-01", "09:05", "10:00"))
            .unwrap();

        let display = store.list_display(&Utc).unwrap();
        let broken = display.iter().find(|e| e.title == "Broken").unwrap();
        assert_eq!(broken.date_label, "Invalid Date");
        assert_eq!(broken.time_label, "Invalid Time");

        let good = display.iter().find(|e| e.title == "Manual Entry").unwrap();
        assert_eq!(good.date_label, "01/03/2025");
        assert_eq!(good.time_label, "09:05");
    }

    #[test]
    fn null_location_and_description_read_as_empty() {
        let store = EventStore::in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO events (source_type, title, start_iso, end_iso, created_at) VALUES ('ical', 'Bare', '2025-03-01T09:00:00.000Z', '2025-03-01T09:00:00.000Z', 'now')",
                [],
            )
            .unwrap();

        let events = store.list_all().unwrap();
        assert_eq!(events[0].location, "");
        assert_eq!(events[0].description, "");
        assert_eq!(events[0].uid, None);
    }

    #[test]
    fn unknown_source_type_is_skipped() {
        let store = EventStore::in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO events (source_type, title, start_iso, end_iso, created_at) VALUES ('caldav', 'Odd', '2025-03-01T09:00:00.000Z', '2025-03-01T09:00:00.000Z', 'now')",
                [],
            )
            .unwrap();
        store
            .insert_manual(&manual_event("2025-03-02", "09:00", "10:00"))
            .unwrap();

        let events = store.list_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_type, SourceType::Manual);
        assert_eq!(store.list_display(&Utc).unwrap().len(), 1);
    }

    #[test]
    fn deleting_import_keeps_its_events() {
        let mut store = EventStore::in_memory().unwrap();
        let summary = store
            .import_feed("https://example.com/a.ics", &[feed_event("a", utc(2025, 3, 1, 9, 0))])
            .unwrap();

        assert!(store.delete_import(summary.import_id).unwrap());
        assert!(!store.delete_import(summary.import_id).unwrap());

        let events = store.list_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].import_id, None);
        assert_eq!(events[0].source_type, SourceType::Feed);

        // Orphaned feed events are still replaced by the next import.
        store.import_feed("https://example.com/a.ics", &[]).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn imports_listed_newest_first() {
        let mut store = EventStore::in_memory().unwrap();
        store.import_feed("https://a.example/1.ics", &[]).unwrap();
        store.import_feed("https://a.example/2.ics", &[]).unwrap();

        let imports = store.list_imports().unwrap();
        assert_eq!(imports[0].source_url, "https://a.example/2.ics");
        assert_eq!(imports[1].source_url, "https://a.example/1.ics");
        assert!(imports[0].imported_at >= imports[1].imported_at);
    }

    #[test]
    fn shared_store_runs_closures() {
        let shared = SharedStore::new(EventStore::in_memory().unwrap());
        let clone = shared.clone();

        clone
            .with(|store| store.import_feed("https://example.com/a.ics", &[feed_event("a", utc(2025, 3, 1, 9, 0))]))
            .unwrap();

        let count = shared.with(|store| Ok(store.list_all()?.len())).unwrap();
        assert_eq!(count, 1);
    }
}
