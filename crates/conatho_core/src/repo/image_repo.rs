//! Image repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the full image and thumbnail blobs of an entity (`images`).
//! - Keep `entities.image` in step with the presence of an image row.
//!
//! # Invariants
//! - At most one image row per entity.
//! - `insert_image` writes the row and the entity flag in one transaction.

use crate::model::entity::EntityId;
use crate::repo::{id_blob, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for entity images.
pub trait ImageRepository {
    /// First attach: inserts the row and sets `entities.image`.
    fn insert_image(&self, entity: EntityId, image: &[u8], thumbnail: &[u8]) -> RepoResult<()>;
    /// Later attach: overwrites both blobs in place.
    fn update_image(&self, entity: EntityId, image: &[u8], thumbnail: &[u8]) -> RepoResult<()>;
    fn image_exists(&self, entity: EntityId) -> RepoResult<bool>;
    fn fetch_image(&self, entity: EntityId) -> RepoResult<Vec<u8>>;
    fn fetch_thumbnail(&self, entity: EntityId) -> RepoResult<Vec<u8>>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn fetch_column(&self, entity: EntityId, sql: &str) -> RepoResult<Vec<u8>> {
        self.conn
            .query_row(sql, [id_blob(&entity)], |row| row.get::<_, Vec<u8>>(0))
            .optional()?
            .ok_or_else(|| RepoError::not_found(RecordKind::Image, entity))
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn insert_image(&self, entity: EntityId, image: &[u8], thumbnail: &[u8]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO images (id, image, thumbnail) VALUES (?1, ?2, ?3);",
            params![id_blob(&entity), image, thumbnail],
        )?;
        let changed = tx.execute(
            "UPDATE entities SET image = TRUE WHERE id = ?1;",
            [id_blob(&entity)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Entity, entity));
        }
        tx.commit()?;
        Ok(())
    }

    fn update_image(&self, entity: EntityId, image: &[u8], thumbnail: &[u8]) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE images SET image = ?1, thumbnail = ?2 WHERE id = ?3;",
            params![image, thumbnail, id_blob(&entity)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Image, entity));
        }
        Ok(())
    }

    fn image_exists(&self, entity: EntityId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM images WHERE id = ?1);",
            [id_blob(&entity)],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn fetch_image(&self, entity: EntityId) -> RepoResult<Vec<u8>> {
        self.fetch_column(entity, "SELECT image FROM images WHERE id = ?1;")
    }

    fn fetch_thumbnail(&self, entity: EntityId) -> RepoResult<Vec<u8>> {
        self.fetch_column(entity, "SELECT thumbnail FROM images WHERE id = ?1;")
    }
}
