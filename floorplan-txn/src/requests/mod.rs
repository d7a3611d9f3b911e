//! Built-in requests.

mod composite;
mod lifecycle;
mod purge;
mod set_field;
mod set_flag;
mod share_field;
mod snapshot;

pub use composite::CompositeRequest;
pub use lifecycle::{CreateEntityRequest, RemoveEntityRequest};
pub use purge::PurgeRemovedRequest;
pub use set_field::SetFieldRequest;
pub use set_flag::SetFlagRequest;
pub use share_field::ShareFieldRequest;
pub use snapshot::{Mutation, SnapshotRequest};

use crate::error::{TxnError, TxnResult};
use floorplan_model::{Document, Entity, ModelError};
use floorplan_types::{EntityFlags, EntityId};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Factory tags of the built-in requests.
pub mod types {
    pub const SET_FIELD: &str = "SetField";
    pub const SET_FLAG: &str = "SetFlag";
    pub const CREATE_ENTITY: &str = "CreateEntity";
    pub const REMOVE_ENTITY: &str = "RemoveEntity";
    pub const SHARE_FIELD: &str = "ShareField";
    pub const PURGE_REMOVED: &str = "PurgeRemoved";
    pub const SNAPSHOT: &str = "Snapshot";
    pub const COMPOSITE: &str = "Composite";
}

/// The entity, which must exist.
pub(crate) fn existing(doc: &Document, id: EntityId) -> TxnResult<&Entity> {
    doc.entity(id).ok_or_else(|| TxnError::InvalidTarget {
        entity: id,
        reason: "entity not found".to_string(),
    })
}

/// The entity, which must exist and not be removed.
pub(crate) fn live(doc: &Document, id: EntityId) -> TxnResult<&Entity> {
    let entity = existing(doc, id)?;
    if entity.is_removed() {
        return Err(TxnError::PreconditionFailed {
            entity: id,
            reason: "entity is removed".to_string(),
        });
    }
    Ok(entity)
}

/// The entity, which must be live and neither frozen nor locked.
pub(crate) fn editable(doc: &Document, id: EntityId) -> TxnResult<&Entity> {
    let entity = live(doc, id)?;
    if entity.flags().intersects(EntityFlags::EDIT_BLOCKING) {
        return Err(TxnError::PreconditionFailed {
            entity: id,
            reason: "entity is frozen or locked".to_string(),
        });
    }
    Ok(entity)
}

/// Maps field-level model errors onto request errors.
pub(crate) fn field_error(entity: EntityId, err: ModelError) -> TxnError {
    match err {
        ModelError::InvalidValue { reason, field, .. } => TxnError::PreconditionFailed {
            entity,
            reason: format!("{field}: {reason}"),
        },
        e @ (ModelError::UnknownField { .. } | ModelError::NotAStateField { .. }) => {
            TxnError::InvalidTarget {
                entity,
                reason: e.to_string(),
            }
        }
        other => TxnError::Model(other),
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(request_type: &str, args: &Value) -> TxnResult<T> {
    serde_json::from_value(args.clone()).map_err(|e| TxnError::InvalidArgs {
        request_type: request_type.to_string(),
        reason: e.to_string(),
    })
}
