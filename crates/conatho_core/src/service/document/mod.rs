//! Open document: store handle plus its in-memory graph mirror.
//!
//! # Responsibility
//! - Own the SQLite connection of one document file for its lifetime.
//! - Cache entities, connections and attribute types in ordered maps.
//! - Route every mutation through the store before touching memory.
//!
//! # Invariants
//! - A store failure leaves the in-memory graph unchanged.
//! - Every connection id in an entity's adjacency list names a connection
//!   touching that entity, and both endpoints list it.
//! - Single-threaded: a `Document` is driven by one control thread. Worker
//!   threads would need one mutex around the whole `Document`.

use crate::config::DocumentConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::imaging::ImageError;
use crate::model::attribute::{AttributeId, AttributeType, AttributeTypeId, Datatype};
use crate::model::entity::{Connection, ConnectionId, Entity, EntityId};
use crate::model::ordered::OrderedMap;
use crate::repo::attribute_repo::SqliteAttributeRepository;
use crate::repo::connection_repo::{ConnectionRepository, SqliteConnectionRepository};
use crate::repo::entity_repo::{EntityRepository, SqliteEntityRepository};
use crate::repo::image_repo::SqliteImageRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

mod attributes;
mod graph;
mod images;

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors from document operations.
#[derive(Debug)]
pub enum DocumentError {
    /// Document file could not be opened or initialised.
    Db(DbError),
    /// Row-level store failure.
    Repo(RepoError),
    /// Image input could not be decoded or re-encoded.
    Image(ImageError),
    /// Superior and inferior are the same entity.
    SelfConnection(EntityId),
    EntityNotFound(EntityId),
    ConnectionNotFound(ConnectionId),
    /// Type id is not in the loaded attribute type cache.
    UnknownAttributeType(AttributeTypeId),
    AttributeNotFound {
        entity: EntityId,
        attribute: AttributeId,
    },
    /// Value shape disagrees with the attribute's declared datatype.
    AttributeTypeMismatch {
        attribute: AttributeId,
        expected: Datatype,
        actual: Datatype,
    },
    NoImage(EntityId),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Image(err) => write!(f, "{err}"),
            Self::SelfConnection(id) => write!(f, "entity {id} can not connect to itself"),
            Self::EntityNotFound(id) => write!(f, "entity not found: {id}"),
            Self::ConnectionNotFound(id) => write!(f, "connection not found: {id}"),
            Self::UnknownAttributeType(id) => write!(f, "unknown attribute type: {id}"),
            Self::AttributeNotFound { entity, attribute } => {
                write!(f, "attribute {attribute} not found on entity {entity}")
            }
            Self::AttributeTypeMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "attribute {attribute} holds {expected} values, got {actual}"
            ),
            Self::NoImage(id) => write!(f, "entity has no image: {id}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DocumentError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for DocumentError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ImageError> for DocumentError {
    fn from(value: ImageError) -> Self {
        Self::Image(value)
    }
}

/// One open document.
#[derive(Debug)]
pub struct Document {
    conn: rusqlite::Connection,
    config: DocumentConfig,
    path: Option<PathBuf>,
    entities: OrderedMap<EntityId, Entity>,
    connections: OrderedMap<ConnectionId, Connection>,
    attribute_types: OrderedMap<AttributeTypeId, AttributeType>,
}

impl Document {
    /// Opens (creating if absent) the document file at `path`.
    ///
    /// The in-memory graph starts empty; call `load_all` and
    /// `load_attribute_types` to populate it.
    pub fn open(path: impl AsRef<Path>) -> DocumentResult<Self> {
        Self::open_with_config(path, DocumentConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: DocumentConfig,
    ) -> DocumentResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path, config.busy_timeout)?;
        Ok(Self::from_parts(conn, config, Some(path.to_path_buf())))
    }

    /// Opens a transient document that lives only as long as the value.
    pub fn open_in_memory() -> DocumentResult<Self> {
        let config = DocumentConfig::default();
        let conn = open_db_in_memory(config.busy_timeout)?;
        Ok(Self::from_parts(conn, config, None))
    }

    /// Opens `path` and loads the graph and attribute types.
    pub fn load(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let mut document = Self::open(path)?;
        document.load_all()?;
        document.load_attribute_types()?;
        Ok(document)
    }

    fn from_parts(
        conn: rusqlite::Connection,
        config: DocumentConfig,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            conn,
            config,
            path,
            entities: OrderedMap::new(),
            connections: OrderedMap::new(),
            attribute_types: OrderedMap::new(),
        }
    }

    /// Closes the store handle, reporting a failed close.
    ///
    /// Dropping a `Document` also closes it; this only surfaces the error.
    pub fn close(self) -> DocumentResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| DocumentError::Db(DbError::Sqlite(err)))
    }

    /// File backing this document, `None` for in-memory documents.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Replaces the in-memory graph with the store's entity and connection
    /// tables.
    ///
    /// Both tables are read before memory is touched, so a failed read keeps
    /// the previous graph. Order afterwards is store return order.
    /// Connections with an endpoint missing from the entity table stay in
    /// the connection map but are not attached to any adjacency list.
    pub fn load_all(&mut self) -> DocumentResult<()> {
        let started_at = Instant::now();
        let entities = self.entity_repo().list_entities()?;
        let connections = self.connection_repo().list_connections()?;

        self.entities
            .rebuild(entities.into_iter().map(|entity| (entity.id, entity)));

        let mut skipped_endpoints = 0usize;
        for connection in &connections {
            for endpoint in [connection.superior, connection.inferior] {
                match self.entities.get_mut(&endpoint) {
                    Some(entity) => {
                        entity.attach_connection(connection.id);
                    }
                    None => skipped_endpoints += 1,
                }
            }
        }
        self.connections.rebuild(
            connections
                .into_iter()
                .map(|connection| (connection.id, connection)),
        );

        if skipped_endpoints > 0 {
            warn!(
                "event=graph_load module=document status=skipped missing_endpoints={}",
                skipped_endpoints
            );
        }
        info!(
            "event=graph_load module=document status=ok entities={} connections={} duration_ms={}",
            self.entities.len(),
            self.connections.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entities in enumeration order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn entity_ids(&self) -> &[EntityId] {
        self.entities.keys()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connections in enumeration order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    pub fn connection_ids(&self) -> &[ConnectionId] {
        self.connections.keys()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections in `entity`'s adjacency list, in list order.
    pub fn connections_of(&self, entity: EntityId) -> Vec<&Connection> {
        self.entities
            .get(&entity)
            .map(|entity| {
                entity
                    .connections
                    .iter()
                    .filter_map(|id| self.connections.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn require_entity(&self, id: EntityId) -> DocumentResult<&Entity> {
        self.entities
            .get(&id)
            .ok_or(DocumentError::EntityNotFound(id))
    }

    fn entity_repo(&self) -> SqliteEntityRepository<'_> {
        SqliteEntityRepository::new(&self.conn)
    }

    fn connection_repo(&self) -> SqliteConnectionRepository<'_> {
        SqliteConnectionRepository::new(&self.conn)
    }

    fn attribute_repo(&self) -> SqliteAttributeRepository<'_> {
        SqliteAttributeRepository::new(&self.conn)
    }

    fn image_repo(&self) -> SqliteImageRepository<'_> {
        SqliteImageRepository::new(&self.conn)
    }
}
