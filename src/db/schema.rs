//! SQL DDL for the per-layer record tables.
//!
//! Each of the six layers gets its own `<layer>_memories` table; a shared
//! `schema_meta` table tracks the schema version and bookkeeping keys. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

use crate::memory::types::Category;

/// Shared bookkeeping table.
const META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// DDL for one layer's record table. Table names come from the closed
/// [`Category`] set, never from caller input.
fn layer_table_sql(category: Category) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL CHECK(length(content) > 0),
    created_at TEXT NOT NULL,
    importance REAL NOT NULL DEFAULT 0.5,
    emotional_intensity REAL NOT NULL DEFAULT 0.5,
    context TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '',
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0),
    last_accessed TEXT
);
"#,
        table = category.table()
    )
}

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(META_SQL)?;
    for category in Category::ALL {
        conn.execute_batch(&layer_table_sql(category))?;
    }

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"schema_meta".to_string()));
        for category in Category::ALL {
            assert!(tables.contains(&category.table()), "missing {}", category.table());
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn empty_content_is_rejected_by_the_table() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO semantic_memories (content, created_at) VALUES ('', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
