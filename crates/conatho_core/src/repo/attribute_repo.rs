//! Attribute type and attribute repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist document-wide attribute types (`attribute_types` table).
//! - Persist per-entity attribute rows (`attributes` table) whose value is
//!   spread over three mutually exclusive nullable columns.
//!
//! # Invariants
//! - Writing a value sets its own column and clears the other two.
//! - Read paths project only the column matching the type's datatype.

use crate::model::attribute::{
    Attribute, AttributeId, AttributeType, AttributeTypeId, AttributeValue, Datatype,
};
use crate::model::entity::EntityId;
use crate::repo::{id_blob, parse_id_blob, RecordKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for attribute types and attributes.
pub trait AttributeRepository {
    fn insert_attribute_type(&self, name: &str, datatype: Datatype)
        -> RepoResult<AttributeTypeId>;
    fn list_attribute_types(&self) -> RepoResult<Vec<AttributeType>>;
    /// Inserts an unset attribute bound to `type_id`.
    fn insert_attribute(&self, entity: EntityId, type_id: AttributeTypeId)
        -> RepoResult<AttributeId>;
    /// Declared datatype of an attribute owned by `entity`, if it exists.
    fn attribute_datatype(
        &self,
        entity: EntityId,
        attribute_id: AttributeId,
    ) -> RepoResult<Option<Datatype>>;
    fn update_attribute_value(
        &self,
        entity: EntityId,
        attribute_id: AttributeId,
        value: &AttributeValue,
    ) -> RepoResult<()>;
    fn delete_attribute(&self, entity: EntityId, attribute_id: AttributeId) -> RepoResult<()>;
    /// Attributes of `entity` joined with their types, in store order.
    fn list_attributes(&self, entity: EntityId) -> RepoResult<Vec<Attribute>>;
}

/// SQLite-backed attribute repository.
pub struct SqliteAttributeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AttributeRepository for SqliteAttributeRepository<'_> {
    fn insert_attribute_type(
        &self,
        name: &str,
        datatype: Datatype,
    ) -> RepoResult<AttributeTypeId> {
        let id = self.conn.query_row(
            "INSERT INTO attribute_types (name, datatype) VALUES (?1, ?2) RETURNING id;",
            params![name, datatype.to_db()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(id)
    }

    fn list_attribute_types(&self) -> RepoResult<Vec<AttributeType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, datatype FROM attribute_types ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(AttributeType {
                id: row.get("id")?,
                name: row.get("name")?,
                datatype: read_datatype(row, "attribute_types.datatype")?,
            });
        }
        Ok(types)
    }

    fn insert_attribute(
        &self,
        entity: EntityId,
        type_id: AttributeTypeId,
    ) -> RepoResult<AttributeId> {
        let id = self.conn.query_row(
            "INSERT INTO attributes (entity, type) VALUES (?1, ?2) RETURNING id;",
            params![id_blob(&entity), type_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(id)
    }

    fn attribute_datatype(
        &self,
        entity: EntityId,
        attribute_id: AttributeId,
    ) -> RepoResult<Option<Datatype>> {
        let raw = self
            .conn
            .query_row(
                "SELECT attribute_types.datatype
                 FROM attributes
                 JOIN attribute_types ON attributes.type = attribute_types.id
                 WHERE attributes.entity = ?1 AND attributes.id = ?2;",
                params![id_blob(&entity), attribute_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        raw.map(|value| {
            Datatype::from_db(value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid datatype `{value}` in attribute_types.datatype"
                ))
            })
        })
        .transpose()
    }

    fn update_attribute_value(
        &self,
        entity: EntityId,
        attribute_id: AttributeId,
        value: &AttributeValue,
    ) -> RepoResult<()> {
        let (num, text, data) = match value {
            AttributeValue::Number(number) => (Some(*number), None, None),
            AttributeValue::Text(text) => (None, Some(text.as_str()), None),
            AttributeValue::Bytes(bytes) => (None, None, Some(bytes.as_slice())),
        };
        let changed = self.conn.execute(
            "UPDATE attributes SET num = ?1, str = ?2, data = ?3
             WHERE entity = ?4 AND id = ?5;",
            params![num, text, data, id_blob(&entity), attribute_id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Attribute, attribute_id));
        }
        Ok(())
    }

    fn delete_attribute(&self, entity: EntityId, attribute_id: AttributeId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM attributes WHERE entity = ?1 AND id = ?2;",
            params![id_blob(&entity), attribute_id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(RecordKind::Attribute, attribute_id));
        }
        Ok(())
    }

    fn list_attributes(&self, entity: EntityId) -> RepoResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                attributes.id AS id,
                attributes.entity AS entity,
                attributes.type AS type_id,
                attribute_types.name AS name,
                attribute_types.datatype AS datatype,
                attributes.num AS num,
                attributes.str AS str,
                attributes.data AS data
             FROM attributes
             JOIN attribute_types ON attributes.type = attribute_types.id
             WHERE attributes.entity = ?1;",
        )?;
        let mut rows = stmt.query([id_blob(&entity)])?;
        let mut attributes = Vec::new();
        while let Some(row) = rows.next()? {
            attributes.push(read_attribute(row)?);
        }
        Ok(attributes)
    }
}

fn read_attribute(row: &Row<'_>) -> RepoResult<Attribute> {
    let entity: Vec<u8> = row.get("entity")?;
    let datatype = read_datatype(row, "attribute_types.datatype")?;
    let value = match datatype {
        Datatype::Number => row.get::<_, Option<i64>>("num")?.map(AttributeValue::Number),
        Datatype::String => row.get::<_, Option<String>>("str")?.map(AttributeValue::Text),
        Datatype::Data => row.get::<_, Option<Vec<u8>>>("data")?.map(AttributeValue::Bytes),
    };
    Ok(Attribute {
        id: row.get("id")?,
        entity: parse_id_blob(&entity, "attributes.entity")?,
        type_id: row.get("type_id")?,
        name: row.get("name")?,
        datatype,
        value,
    })
}

fn read_datatype(row: &Row<'_>, column: &str) -> RepoResult<Datatype> {
    let raw: i64 = row.get("datatype")?;
    Datatype::from_db(raw)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid datatype `{raw}` in {column}")))
}

#[cfg(test)]
mod tests {
    use super::{AttributeRepository, SqliteAttributeRepository};
    use crate::db::open_db_in_memory;
    use crate::model::attribute::{AttributeValue, Datatype};
    use crate::repo::RepoError;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn attribute_type_ids_increase() {
        let conn = open_db_in_memory(Duration::from_secs(1)).unwrap();
        let repo = SqliteAttributeRepository::new(&conn);

        let first = repo.insert_attribute_type("Age", Datatype::Number).unwrap();
        let second = repo.insert_attribute_type("Age", Datatype::String).unwrap();
        assert!(second > first);

        let types = repo.list_attribute_types().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[1].datatype, Datatype::String);
    }

    #[test]
    fn writing_a_value_clears_other_columns() {
        let conn = open_db_in_memory(Duration::from_secs(1)).unwrap();
        let repo = SqliteAttributeRepository::new(&conn);
        let entity = Uuid::new_v4();

        let type_id = repo.insert_attribute_type("Note", Datatype::String).unwrap();
        let attribute_id = repo.insert_attribute(entity, type_id).unwrap();
        repo.update_attribute_value(entity, attribute_id, &AttributeValue::Number(9))
            .unwrap();
        repo.update_attribute_value(entity, attribute_id, &AttributeValue::from("hi"))
            .unwrap();

        let num: Option<i64> = conn
            .query_row("SELECT num FROM attributes WHERE id = ?1;", [attribute_id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(num, None);

        let attributes = repo.list_attributes(entity).unwrap();
        assert_eq!(attributes[0].value, Some(AttributeValue::from("hi")));
    }

    #[test]
    fn updates_are_scoped_to_the_owning_entity() {
        let conn = open_db_in_memory(Duration::from_secs(1)).unwrap();
        let repo = SqliteAttributeRepository::new(&conn);
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let type_id = repo.insert_attribute_type("Size", Datatype::Number).unwrap();
        let attribute_id = repo.insert_attribute(owner, type_id).unwrap();

        let err = repo
            .update_attribute_value(other, attribute_id, &AttributeValue::Number(1))
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
        assert_eq!(repo.attribute_datatype(other, attribute_id).unwrap(), None);
        assert_eq!(
            repo.attribute_datatype(owner, attribute_id).unwrap(),
            Some(Datatype::Number)
        );
    }

    #[test]
    fn insert_attribute_with_unknown_type_violates_foreign_key() {
        let conn = open_db_in_memory(Duration::from_secs(1)).unwrap();
        let repo = SqliteAttributeRepository::new(&conn);

        let err = repo.insert_attribute(Uuid::new_v4(), 404).unwrap_err();
        assert!(matches!(err, RepoError::Db(_)));
    }
}
