use rusqlite::Connection;
use strata::db;
use strata::memory::types::Category;
use tempfile::TempDir;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn open_creates_every_layer_table() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("memory.db")).unwrap();
    let tables = table_names(&conn);

    assert!(tables.contains(&"schema_meta".to_string()));
    for layer in Category::ALL {
        assert!(tables.contains(&layer.table()), "missing table for {layer}");
    }
}

#[test]
fn empty_content_is_rejected_by_the_schema() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("memory.db")).unwrap();
    let result = conn.execute(
        "INSERT INTO semantic_memories (content, created_at) VALUES ('', '2026-01-01T00:00:00Z')",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn open_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("memory.db");
    drop(db::open_database(&path).unwrap());
    let conn = db::open_database(&path).unwrap();
    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.layer_counts.len(), 6);
}
