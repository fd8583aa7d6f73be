use mtss_core::db::migrations::latest_version;
use mtss_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "sheets");
    assert_table_exists(&conn, "cells");
    assert_table_exists(&conn, "named_ranges");
    assert_table_exists(&conn, "charts");
}

#[test]
fn opening_same_workbook_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mtss.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "cells");
}

#[test]
fn opening_workbook_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_workbook_in_missing_directory_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_folder").join("classroom.sqlite3");

    let err = open_db(&path).unwrap_err();

    match &err {
        DbError::Open { location, .. } => {
            assert_eq!(location, &path.display().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("classroom.sqlite3"));
    assert!(std::error::Error::source(&err).is_some());
    assert!(!err.is_busy());
}

#[test]
fn foreign_keys_are_enabled() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn cell_kind_and_content_must_agree() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO sheets (name, position) VALUES ('Summary', 1);", [])
        .unwrap();

    let result = conn.execute(
        "INSERT INTO cells (sheet_id, row_index, col_index, kind, content, note)
         VALUES (1, 2, 2, 'formula', NULL, NULL);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
