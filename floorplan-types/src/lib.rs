//! Core type definitions for the floorplan document model.
//!
//! This crate defines the fundamental, entity-agnostic types used throughout
//! the core engine:
//! - Entity and StateField identifiers (UUID v7)
//! - Class and request tags used for registry lookup
//! - Entity flags and dirty kinds
//!
//! All kind-specific types (boxes, moldings, lights, layers, ...) belong in
//! their respective entity modules, not here.

mod flags;
mod ids;
mod tag;

pub use flags::{DirtyKind, DirtyKinds, EntityFlags};
pub use ids::{EntityId, StateId};
pub use tag::{ClassTag, RequestType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid tag: {0:?}")]
    InvalidTag(String),
}
