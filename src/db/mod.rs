pub mod migrations;
pub mod schema;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MemoryError, Result};
use crate::memory::types::Category;

/// `schema_meta` key recording when the store last received a snapshot.
pub const LAST_IMPORT_KEY: &str = "last_import_at";

/// Open (or create) a store database at the given path with pragmas set and
/// schema initialized.
///
/// Any failure here means the store cannot be reached, so it is reported as
/// [`MemoryError::StorageUnavailable`].
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let unavailable = |reason: String| MemoryError::StorageUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            unavailable(format!("failed to create directory {}: {e}", parent.display()))
        })?;
    }

    let conn = Connection::open(path).map_err(|e| unavailable(e.to_string()))?;
    configure(&conn).map_err(|e| unavailable(e.to_string()))?;

    schema::init_schema(&conn)
        .map_err(|e| unavailable(format!("failed to initialize schema: {e}")))?;
    migrations::run_migrations(&conn)
        .map_err(|e| unavailable(format!("failed to run migrations: {e}")))?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for concurrent readers; FULL sync so an acknowledged write survives a crash
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;
    Ok(())
}

/// Open an in-memory database for testing.
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Read a `schema_meta` value.
pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Insert or replace a `schema_meta` value.
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub schema_version: u32,
    pub layer_counts: BTreeMap<Category, u64>,
    pub last_import_at: Option<String>,
}

/// Run SQLite's integrity check and gather row counts per layer.
pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let schema_version = migrations::get_schema_version(conn)?;

    let mut layer_counts = BTreeMap::new();
    for category in Category::ALL {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", category.table()),
            [],
            |row| row.get(0),
        )?;
        layer_counts.insert(category, count as u64);
    }

    Ok(HealthReport {
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
        schema_version,
        layer_counts,
        last_import_at: get_meta(conn, LAST_IMPORT_KEY)?,
    })
}
