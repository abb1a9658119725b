//! Document domain model.
//!
//! # Responsibility
//! - Define the entity/connection graph records mirrored from the store.
//! - Define the attribute type system shared across one document.
//!
//! # Invariants
//! - Entities and connections are identified by stable 128-bit ids.
//! - Attribute types and attributes use store-assigned integer ids.

pub mod attribute;
pub mod entity;
pub mod ordered;
