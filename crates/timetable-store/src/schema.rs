//! Connection setup and idempotent schema creation.

use std::path::Path;

use rusqlite::{Connection, Result};

const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Creates tables and indexes. Safe to run on every startup.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(INIT_SQL)
}

pub fn open_and_migrate(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = open(path)?;
    migrate(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrate(&conn)?;
    Ok(conn)
}
