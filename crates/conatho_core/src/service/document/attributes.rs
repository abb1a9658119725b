//! Attribute type cache and per-entity attribute operations.

use super::{Document, DocumentError, DocumentResult};
use crate::model::attribute::{
    Attribute, AttributeId, AttributeType, AttributeTypeId, AttributeValue, Datatype,
};
use crate::model::entity::EntityId;
use crate::repo::attribute_repo::AttributeRepository;
use log::info;

impl Document {
    /// Replaces the attribute type cache with the store's type table.
    ///
    /// The cache is never refreshed implicitly; `add_attribute` trusts it.
    pub fn load_attribute_types(&mut self) -> DocumentResult<()> {
        let types = self.attribute_repo().list_attribute_types()?;
        self.attribute_types
            .rebuild(types.into_iter().map(|kind| (kind.id, kind)));
        Ok(())
    }

    /// Creates a document-wide attribute type and caches it.
    pub fn add_attribute_type(
        &mut self,
        name: impl Into<String>,
        datatype: Datatype,
    ) -> DocumentResult<AttributeTypeId> {
        let name = name.into();
        let id = self.attribute_repo().insert_attribute_type(&name, datatype)?;
        self.attribute_types.insert(id, AttributeType { id, name, datatype });
        info!(
            "event=attribute_type_create module=document status=ok attribute_type={id} datatype={datatype}"
        );
        Ok(id)
    }

    pub fn attribute_type(&self, id: AttributeTypeId) -> Option<&AttributeType> {
        self.attribute_types.get(&id)
    }

    /// Cached attribute types in id order after a load, creation order after.
    pub fn attribute_types(&self) -> impl Iterator<Item = &AttributeType> + '_ {
        self.attribute_types.values()
    }

    /// Adds an unset attribute of type `type_id` to `entity`.
    ///
    /// # Errors
    /// - `UnknownAttributeType` when `type_id` is not cached; no row is written.
    pub fn add_attribute(
        &mut self,
        entity: EntityId,
        type_id: AttributeTypeId,
    ) -> DocumentResult<AttributeId> {
        self.require_entity(entity)?;
        if !self.attribute_types.contains_key(&type_id) {
            return Err(DocumentError::UnknownAttributeType(type_id));
        }
        let id = self.attribute_repo().insert_attribute(entity, type_id)?;
        Ok(id)
    }

    /// Stores `value` into an attribute of `entity`.
    ///
    /// # Errors
    /// - `AttributeNotFound` when the attribute does not belong to `entity`.
    /// - `AttributeTypeMismatch` when the value shape differs from the
    ///   attribute type's datatype; nothing is written.
    pub fn update_attribute(
        &mut self,
        entity: EntityId,
        attribute: AttributeId,
        value: impl Into<AttributeValue>,
    ) -> DocumentResult<()> {
        let value = value.into();
        let repo = self.attribute_repo();
        let expected = repo
            .attribute_datatype(entity, attribute)?
            .ok_or(DocumentError::AttributeNotFound { entity, attribute })?;
        let actual = value.datatype();
        if expected != actual {
            return Err(DocumentError::AttributeTypeMismatch {
                attribute,
                expected,
                actual,
            });
        }
        repo.update_attribute_value(entity, attribute, &value)?;
        Ok(())
    }

    pub fn remove_attribute(
        &mut self,
        entity: EntityId,
        attribute: AttributeId,
    ) -> DocumentResult<()> {
        self.attribute_repo().delete_attribute(entity, attribute)?;
        Ok(())
    }

    /// Attributes of `entity` joined with their type, in store order.
    pub fn attributes(&self, entity: EntityId) -> DocumentResult<Vec<Attribute>> {
        Ok(self.attribute_repo().list_attributes(entity)?)
    }
}
