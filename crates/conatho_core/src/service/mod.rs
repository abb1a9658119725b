//! Core use-case services.
//!
//! # Responsibility
//! - Keep the in-memory graph and the durable store consistent.
//! - Expose the collaborator-facing document API to UI/CLI layers.

pub mod document;
