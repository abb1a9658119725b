//! Entity and connection records.
//!
//! # Responsibility
//! - Define graph nodes (entities) and directed, named edges (connections).
//! - Maintain per-entity adjacency lists without duplicates.
//!
//! # Invariants
//! - `id` is generated once and never reused for another record.
//! - A connection never has `superior == inferior`.
//! - `Entity::connections` holds each touching connection id exactly once,
//!   regardless of direction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an entity; also the key external thumbnail caches use.
pub type EntityId = Uuid;

/// Stable identifier of a connection.
pub type ConnectionId = Uuid;

/// Graph node with canvas position, display name and optional image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Canvas X position. Callers mutate it directly and then write it back.
    pub x: i32,
    /// Canvas Y position.
    pub y: i32,
    pub name: String,
    /// True exactly when an image record exists for `id`.
    pub has_image: bool,
    /// Adjacency: ids of connections where this entity is superior or inferior.
    pub connections: Vec<ConnectionId>,
}

impl Entity {
    /// Creates a new entity with a generated stable ID and no connections.
    pub fn new(x: i32, y: i32, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), x, y, name)
    }

    /// Creates an entity with a caller-provided ID, used by store loads.
    pub fn with_id(id: EntityId, x: i32, y: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            name: name.into(),
            has_image: false,
            connections: Vec::new(),
        }
    }

    /// Records a touching connection. Returns `false` if it was already known.
    pub fn attach_connection(&mut self, connection_id: ConnectionId) -> bool {
        if self.connections.contains(&connection_id) {
            return false;
        }
        self.connections.push(connection_id);
        true
    }

    /// Forgets a touching connection. Returns `false` if it was not present.
    pub fn detach_connection(&mut self, connection_id: ConnectionId) -> bool {
        match self.connections.iter().position(|id| *id == connection_id) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Directed, named edge from a superior entity to an inferior entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// May be empty.
    pub name: String,
    pub superior: EntityId,
    pub inferior: EntityId,
}

impl Connection {
    /// Creates a new connection with a generated stable ID.
    ///
    /// Does not check `superior != inferior`; the graph layer rejects
    /// self-connections before anything is built.
    pub fn new(superior: EntityId, inferior: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            superior,
            inferior,
        }
    }

    /// Returns the endpoint opposite to `entity`, or `None` if `entity` is
    /// not an endpoint.
    pub fn other_endpoint(&self, entity: EntityId) -> Option<EntityId> {
        if self.superior == entity {
            Some(self.inferior)
        } else if self.inferior == entity {
            Some(self.superior)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Connection, Entity};

    #[test]
    fn attach_connection_ignores_duplicates() {
        let mut entity = Entity::new(0, 0, "A");
        let connection = Connection::new(entity.id, uuid::Uuid::new_v4(), "");

        assert!(entity.attach_connection(connection.id));
        assert!(!entity.attach_connection(connection.id));
        assert_eq!(entity.connections, vec![connection.id]);
    }

    #[test]
    fn detach_connection_reports_missing_ids() {
        let mut entity = Entity::new(0, 0, "A");
        let id = uuid::Uuid::new_v4();
        entity.attach_connection(id);

        assert!(entity.detach_connection(id));
        assert!(!entity.detach_connection(id));
        assert!(entity.connections.is_empty());
    }

    #[test]
    fn other_endpoint_resolves_both_directions() {
        let a = Entity::new(0, 0, "A");
        let b = Entity::new(10, 10, "B");
        let stranger = Entity::new(5, 5, "C");
        let connection = Connection::new(a.id, b.id, "Employs");

        assert_eq!(connection.other_endpoint(a.id), Some(b.id));
        assert_eq!(connection.other_endpoint(b.id), Some(a.id));
        assert_eq!(connection.other_endpoint(stranger.id), None);
    }
}
