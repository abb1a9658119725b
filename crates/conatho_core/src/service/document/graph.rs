//! Entity and connection mutations.

use super::{Document, DocumentError, DocumentResult};
use crate::model::entity::{Connection, ConnectionId, Entity, EntityId};
use crate::repo::connection_repo::ConnectionRepository;
use crate::repo::entity_repo::EntityRepository;
use log::{debug, info, warn};

impl Document {
    /// Creates an entity at `(x, y)` and returns its new id.
    pub fn create_entity(
        &mut self,
        x: i32,
        y: i32,
        name: impl Into<String>,
    ) -> DocumentResult<EntityId> {
        let entity = Entity::new(x, y, name);
        self.entity_repo().insert_entity(&entity)?;

        let id = entity.id;
        self.entities.insert(id, entity);
        info!("event=entity_create module=document status=ok entity={id}");
        Ok(id)
    }

    /// Connects `superior -> inferior` and returns the new connection id.
    ///
    /// # Errors
    /// - `SelfConnection` when both ids are equal; nothing is written.
    /// - `EntityNotFound` when either endpoint is not loaded.
    pub fn connect(
        &mut self,
        superior: EntityId,
        inferior: EntityId,
        name: impl Into<String>,
    ) -> DocumentResult<ConnectionId> {
        if superior == inferior {
            return Err(DocumentError::SelfConnection(superior));
        }
        self.require_entity(superior)?;
        self.require_entity(inferior)?;

        let connection = Connection::new(superior, inferior, name);
        self.connection_repo().insert_connection(&connection)?;

        // Both endpoints were checked above, so both appends happen.
        let id = connection.id;
        for endpoint in [superior, inferior] {
            if let Some(entity) = self.entities.get_mut(&endpoint) {
                entity.attach_connection(id);
            }
        }
        self.connections.insert(id, connection);
        info!(
            "event=connection_create module=document status=ok connection={id} superior={superior} inferior={inferior}"
        );
        Ok(id)
    }

    /// Deletes one connection and strips it from both adjacency lists.
    pub fn remove_connection(&mut self, id: ConnectionId) -> DocumentResult<()> {
        let (superior, inferior) = match self.connections.get(&id) {
            Some(connection) => (connection.superior, connection.inferior),
            None => return Err(DocumentError::ConnectionNotFound(id)),
        };
        self.connection_repo().delete_connection(id)?;

        for endpoint in [superior, inferior] {
            self.detach_from(endpoint, id);
        }
        self.connections.remove(&id);
        info!("event=connection_remove module=document status=ok connection={id}");
        Ok(())
    }

    /// Deletes an entity with every connection touching it.
    ///
    /// The store drops the entity row, its connection rows, its attributes
    /// and its image in one transaction. In memory, each removed connection
    /// is stripped from the opposite endpoint before the entity goes.
    pub fn delete_entity(&mut self, id: EntityId) -> DocumentResult<()> {
        let mut doomed = self.require_entity(id)?.connections.clone();
        // Connections whose adjacency was skipped at load still reference id.
        for connection in self.connection_repo().list_connections_of(id)? {
            if !doomed.contains(&connection.id) {
                doomed.push(connection.id);
            }
        }

        let removed_rows = self.entity_repo().delete_entity_cascade(id)?;

        for connection_id in &doomed {
            let Some(connection) = self.connections.remove(connection_id) else {
                warn!(
                    "event=entity_delete module=document status=skipped entity={id} connection={connection_id} reason=unknown_connection"
                );
                continue;
            };
            if let Some(other) = connection.other_endpoint(id) {
                self.detach_from(other, *connection_id);
            }
        }
        self.entities.remove(&id);
        info!(
            "event=entity_delete module=document status=ok entity={id} connections={} connection_rows={removed_rows}",
            doomed.len()
        );
        Ok(())
    }

    /// Moves an entity in memory only; follow with `update_position` to
    /// persist. Used while dragging.
    pub fn move_entity(&mut self, id: EntityId, x: i32, y: i32) -> DocumentResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(DocumentError::EntityNotFound(id))?;
        entity.x = x;
        entity.y = y;
        Ok(())
    }

    /// Writes the in-memory position of `id` back to the store.
    pub fn update_position(&self, id: EntityId) -> DocumentResult<()> {
        let entity = self.require_entity(id)?;
        self.entity_repo().update_position(id, entity.x, entity.y)?;
        debug!(
            "event=entity_move module=document status=ok entity={id} x={} y={}",
            entity.x, entity.y
        );
        Ok(())
    }

    /// `move_entity` followed by `update_position`.
    pub fn set_position(&mut self, id: EntityId, x: i32, y: i32) -> DocumentResult<()> {
        self.move_entity(id, x, y)?;
        self.update_position(id)
    }

    pub fn rename_entity(&mut self, id: EntityId, name: impl Into<String>) -> DocumentResult<()> {
        let name = name.into();
        self.require_entity(id)?;
        self.entity_repo().rename_entity(id, &name)?;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.name = name;
        }
        Ok(())
    }

    fn detach_from(&mut self, endpoint: EntityId, connection: ConnectionId) {
        match self.entities.get_mut(&endpoint) {
            Some(entity) => {
                entity.detach_connection(connection);
            }
            None => warn!(
                "event=adjacency_strip module=document status=skipped entity={endpoint} connection={connection} reason=missing_endpoint"
            ),
        }
    }
}
