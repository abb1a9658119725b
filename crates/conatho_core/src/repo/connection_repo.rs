//! Connection repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist directed edges (`connections` table).
//!
//! # Invariants
//! - Rows are never updated in place; a connection is inserted or deleted.

use crate::model::entity::{Connection, ConnectionId, EntityId};
use crate::repo::{id_blob, parse_id_blob, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Row};

/// Repository interface for connection persistence.
pub trait ConnectionRepository {
    fn insert_connection(&self, connection: &Connection) -> RepoResult<()>;
    fn delete_connection(&self, id: ConnectionId) -> RepoResult<()>;
    /// Complete connection table in store order.
    fn list_connections(&self) -> RepoResult<Vec<Connection>>;
    /// Connections where `entity` is superior or inferior.
    fn list_connections_of(&self, entity: EntityId) -> RepoResult<Vec<Connection>>;
}

/// SQLite-backed connection repository.
pub struct SqliteConnectionRepository<'conn> {
    conn: &'conn rusqlite::Connection,
}

impl<'conn> SqliteConnectionRepository<'conn> {
    pub fn new(conn: &'conn rusqlite::Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, filter: Option<EntityId>) -> RepoResult<Vec<Connection>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match filter {
            Some(entity) => stmt.query([id_blob(&entity)])?,
            None => stmt.query([])?,
        };
        let mut connections = Vec::new();
        while let Some(row) = rows.next()? {
            connections.push(read_connection(row)?);
        }
        Ok(connections)
    }
}

impl ConnectionRepository for SqliteConnectionRepository<'_> {
    fn insert_connection(&self, connection: &Connection) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO connections (id, superior, inferior, name) VALUES (?1, ?2, ?3, ?4);",
            params![
                id_blob(&connection.id),
                id_blob(&connection.superior),
                id_blob(&connection.inferior),
                connection.name.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete_connection(&self, id: ConnectionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM connections WHERE id = ?1;", [id_blob(&id)])?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Connection, id));
        }
        Ok(())
    }

    fn list_connections(&self) -> RepoResult<Vec<Connection>> {
        self.query("SELECT id, superior, inferior, name FROM connections;", None)
    }

    fn list_connections_of(&self, entity: EntityId) -> RepoResult<Vec<Connection>> {
        self.query(
            "SELECT id, superior, inferior, name FROM connections
             WHERE superior = ?1 OR inferior = ?1;",
            Some(entity),
        )
    }
}

fn read_connection(row: &Row<'_>) -> RepoResult<Connection> {
    let id: Vec<u8> = row.get("id")?;
    let superior: Vec<u8> = row.get("superior")?;
    let inferior: Vec<u8> = row.get("inferior")?;
    Ok(Connection {
        id: parse_id_blob(&id, "connections.id")?,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        superior: parse_id_blob(&superior, "connections.superior")?,
        inferior: parse_id_blob(&inferior, "connections.inferior")?,
    })
}
