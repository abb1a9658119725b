//! Repository layer abstractions and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define per-aggregate CRUD contracts over the document store.
//! - Isolate SQL details from graph/attribute orchestration.
//!
//! # Invariants
//! - Every primitive is one statement, or one transaction when a logical
//!   write spans rows; it fully applies or leaves prior state untouched.
//! - Identifiers are stored as their canonical 16-byte binary form.
//! - Keyed updates/deletes that touch no row return `NotFound`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod attribute_repo;
pub mod connection_repo;
pub mod entity_repo;
pub mod image_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Row kind used to qualify `RepoError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Entity,
    Connection,
    Attribute,
    Image,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Entity => "entity",
            Self::Connection => "connection",
            Self::Attribute => "attribute",
            Self::Image => "image",
        };
        f.write_str(label)
    }
}

/// Generic repository error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Keyed row does not exist. The key is rendered for diagnostics.
    NotFound { kind: RecordKind, key: String },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(kind: RecordKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Binary form of an identifier as bound into SQL.
pub(crate) fn id_blob(id: &Uuid) -> &[u8] {
    id.as_bytes().as_slice()
}

/// Parses a stored identifier blob, rejecting anything but 16 bytes.
pub(crate) fn parse_id_blob(bytes: &[u8], column: &str) -> RepoResult<Uuid> {
    Uuid::from_slice(bytes).map_err(|_| {
        RepoError::InvalidData(format!(
            "identifier in {column} has {} bytes, expected 16",
            bytes.len()
        ))
    })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
