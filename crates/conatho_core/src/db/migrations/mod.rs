//! Document schema registry and executor.
//!
//! # Responsibility
//! - Register schema steps in strictly increasing version order.
//! - Create the schema atomically when the version marker is missing.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to the single `info.version` row.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, ErrorCode};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 0,
    sql: include_str!("0000_init.sql"),
}];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the version marker, initialising the schema when it is absent.
///
/// # Errors
/// - `DbError::Init` when the marker read fails for any reason other than
///   the `info` table being missing, or when schema creation fails.
/// - `DbError::UnsupportedSchemaVersion` when the document is newer than
///   this binary.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = match read_version_marker(conn)? {
        Some(version) => version,
        None => return init_schema(conn),
    };

    let latest = latest_version();
    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(DbError::Init)?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        tx.execute_batch(migration.sql).map_err(DbError::Init)?;
        tx.execute("UPDATE info SET version = ?1;", [migration.version])
            .map_err(DbError::Init)?;
    }
    tx.commit().map_err(DbError::Init)?;

    Ok(())
}

/// Returns the schema version stored in `info`, or `None` if the table is
/// missing (fresh file).
pub fn read_version_marker(conn: &Connection) -> DbResult<Option<i64>> {
    match conn.query_row("SELECT version FROM info LIMIT 1;", [], |row| {
        row.get::<_, i64>(0)
    }) {
        Ok(version) => Ok(Some(version)),
        // An `info` table without its row is a half-written file; schema
        // creation will then fail on the existing tables.
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) if is_missing_table(&err) => Ok(None),
        Err(err) => Err(DbError::Init(err)),
    }
}

fn init_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction().map_err(DbError::Init)?;
    for migration in MIGRATIONS {
        tx.execute_batch(migration.sql).map_err(DbError::Init)?;
    }
    tx.execute("INSERT INTO info (version) VALUES (?1);", [latest_version()])
        .map_err(DbError::Init)?;
    tx.commit().map_err(DbError::Init)?;

    info!(
        "event=schema_init module=db status=ok version={}",
        latest_version()
    );
    Ok(())
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::Unknown
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("no such table"))
        }
        _ => false,
    }
}
