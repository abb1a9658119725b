//! Entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist entity rows (`entities` table).
//! - Cascade entity deletion to its connections, attributes and image.
//!
//! # Invariants
//! - `posx/posy` are stored as 64-bit integers but must fit `i32` on read.
//! - `image` flag is only set together with an image row (see image repo).

use crate::model::entity::{Entity, EntityId};
use crate::repo::{bool_to_int, id_blob, parse_id_blob, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const ENTITY_SELECT_SQL: &str = "SELECT id, name, posx, posy, image FROM entities";

/// Repository interface for entity persistence.
pub trait EntityRepository {
    fn insert_entity(&self, entity: &Entity) -> RepoResult<()>;
    /// Complete entity table in store order, without adjacency.
    fn list_entities(&self) -> RepoResult<Vec<Entity>>;
    fn update_position(&self, id: EntityId, x: i32, y: i32) -> RepoResult<()>;
    fn rename_entity(&self, id: EntityId, name: &str) -> RepoResult<()>;
    /// Deletes the entity row together with every connection, attribute and
    /// image row referring to it. Returns the number of connection rows
    /// removed.
    fn delete_entity_cascade(&self, id: EntityId) -> RepoResult<usize>;
}

/// SQLite-backed entity repository.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn insert_entity(&self, entity: &Entity) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO entities (id, name, posx, posy, image) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id_blob(&entity.id),
                entity.name.as_str(),
                i64::from(entity.x),
                i64::from(entity.y),
                bool_to_int(entity.has_image),
            ],
        )?;
        Ok(())
    }

    fn list_entities(&self) -> RepoResult<Vec<Entity>> {
        let mut stmt = self.conn.prepare(&format!("{ENTITY_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(read_raw_entity(row)?);
        }
        Ok(entities)
    }

    fn update_position(&self, id: EntityId, x: i32, y: i32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entities SET posx = ?1, posy = ?2 WHERE id = ?3;",
            params![i64::from(x), i64::from(y), id_blob(&id)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Entity, id));
        }
        Ok(())
    }

    fn rename_entity(&self, id: EntityId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entities SET name = ?1 WHERE id = ?2;",
            params![name, id_blob(&id)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Entity, id));
        }
        Ok(())
    }

    fn delete_entity_cascade(&self, id: EntityId) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let key = id_blob(&id);
        tx.execute("DELETE FROM images WHERE id = ?1;", [key])?;
        tx.execute("DELETE FROM attributes WHERE entity = ?1;", [key])?;
        let changed = tx.execute("DELETE FROM entities WHERE id = ?1;", [key])?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Entity, id));
        }
        let removed_connections = tx.execute(
            "DELETE FROM connections WHERE superior = ?1 OR inferior = ?1;",
            [key],
        )?;
        tx.commit()?;
        Ok(removed_connections)
    }
}

fn read_raw_entity(row: &Row<'_>) -> RepoResult<Entity> {
    let id_bytes: Vec<u8> = row.get("id")?;
    let id = parse_id_blob(&id_bytes, "entities.id")?;
    let x = read_coordinate(row, "posx")?;
    let y = read_coordinate(row, "posy")?;
    let mut entity = Entity::with_id(id, x, y, row.get::<_, String>("name")?);
    entity.has_image = row.get::<_, Option<bool>>("image")?.unwrap_or(false);
    Ok(entity)
}

fn read_coordinate(row: &Row<'_>, column: &str) -> RepoResult<i32> {
    let value: i64 = row.get(column)?;
    i32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("entities.{column} value {value} exceeds i32 range"))
    })
}
