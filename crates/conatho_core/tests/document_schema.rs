use conatho_core::db::migrations::{latest_version, read_version_marker};
use conatho_core::db::{open_db, DbError};
use conatho_core::{Document, DocumentError};
use rusqlite::Connection;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(1);

#[test]
fn new_file_gets_full_schema_and_version_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.conatho");

    let conn = open_db(&path, TIMEOUT).unwrap();
    assert_eq!(read_version_marker(&conn).unwrap(), Some(latest_version()));
    assert_eq!(latest_version(), 0);
    for table in [
        "info",
        "entities",
        "connections",
        "attribute_types",
        "attributes",
        "images",
    ] {
        assert_table_exists(&conn, table);
    }
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM info;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn reopening_does_not_reinitialise() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twice.conatho");

    let mut document = Document::open(&path).unwrap();
    document.create_entity(1, 1, "kept").unwrap();
    document.close().unwrap();

    let conn = open_db(&path, TIMEOUT).unwrap();
    let entities: i64 = conn
        .query_row("SELECT COUNT(*) FROM entities;", [], |row| row.get(0))
        .unwrap();
    let markers: i64 = conn
        .query_row("SELECT COUNT(*) FROM info;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(entities, 1);
    assert_eq!(markers, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.conatho");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE info (version BIGINT NOT NULL);
         INSERT INTO info (version) VALUES (7);",
    )
    .unwrap();
    drop(conn);

    match Document::open(&path) {
        Err(DocumentError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        })) => {
            assert_eq!(db_version, 7);
            assert_eq!(latest_supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("future schema must not open"),
    }
}

#[test]
fn marker_read_failure_other_than_missing_table_is_init_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odd.conatho");

    // `info` exists but lacks the `version` column.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE info (label TEXT);").unwrap();
    drop(conn);

    let err = open_db(&path, TIMEOUT).unwrap_err();
    assert!(matches!(err, DbError::Init(_)));
}

#[test]
fn non_database_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"this is plain text, not a document file at all").unwrap();

    assert!(Document::open(&path).is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
