//! Error types for the model layer.

use floorplan_types::{ClassTag, EntityId, StateId};
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No class is registered under the tag.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A class is already registered under the tag.
    #[error("entity class already registered: {0}")]
    DuplicateClass(ClassTag),

    /// Entity not found in the document.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with this id is already in the document.
    #[error("entity already exists: {0}")]
    DuplicateEntity(EntityId),

    /// StateField not found in the arena.
    #[error("state field not found: {0}")]
    StateNotFound(StateId),

    /// A StateField with this id is already in the arena.
    #[error("state field already exists: {0}")]
    DuplicateState(StateId),

    /// The entity's class declares no such field.
    #[error("{class} has no field {field:?}")]
    UnknownField { class: ClassTag, field: String },

    /// The field is a direct scalar, not a StateField.
    #[error("field {field:?} of {entity} is not a state field")]
    NotAStateField { entity: EntityId, field: String },

    /// A value was rejected by the field's constraint.
    #[error("invalid value for {entity}.{field}: {reason}")]
    InvalidValue {
        entity: EntityId,
        field: String,
        reason: String,
    },

    /// A value was rejected by a StateField's own constraint.
    #[error("invalid value for state field {state}: {reason}")]
    InvalidStateValue { state: StateId, reason: String },

    /// Re-parenting would create a cycle.
    #[error("parent cycle: {0} cannot be its own ancestor")]
    ParentCycle(EntityId),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
