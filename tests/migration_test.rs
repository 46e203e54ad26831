use rusqlite::Connection;
use strata::db;
use strata::db::migrations::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
use tempfile::TempDir;

#[test]
fn fresh_db_migrates_to_current_version() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("memory.db")).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("memory.db")).unwrap();
    // Running again should be a no-op
    run_migrations(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn manual_v1_db_upgrades_correctly() {
    // Simulate a v1 database that hasn't been migrated
    let conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 1);

    run_migrations(&conn).unwrap();

    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    let indexes: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%_created_at'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(indexes, 6);
}

#[test]
fn reopening_a_v1_file_upgrades_it() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("memory.db");
    {
        let conn = Connection::open(&path).unwrap();
        db::schema::init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO working_memories (content, created_at) VALUES ('kept', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
    }

    let conn = db::open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM working_memories", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
