//! Core document engine for the Conatho diagramming tool.
//! Entities, connections, attributes and images live in one SQLite file;
//! this crate keeps that file and its in-memory graph mirror consistent.

pub mod config;
pub mod db;
pub mod imaging;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::DocumentConfig;
pub use imaging::{ImageError, ProcessedImage};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::attribute::{
    Attribute, AttributeId, AttributeType, AttributeTypeId, AttributeValue, Datatype,
};
pub use model::entity::{Connection, ConnectionId, Entity, EntityId};
pub use repo::{RecordKind, RepoError, RepoResult};
pub use service::document::{Document, DocumentError, DocumentResult};
