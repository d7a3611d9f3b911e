//! Load context: id resolution and issue collection for one load.

use super::record::StateRecord;
use floorplan_types::{EntityId, StateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Options controlling how records are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Give every loaded entity and StateField a fresh id, e.g. when pasting
    /// a dump into the document it came from. Sharing is preserved.
    pub remap_ids: bool,
}

/// A problem found while loading that did not stop the load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadIssue {
    #[error("record {index}: unknown entity type {class_tag:?}")]
    UnknownEntityType { index: usize, class_tag: String },

    #[error("{entity}.{field}: state field reference {reference:?} does not resolve")]
    InvalidStateReference {
        entity: EntityId,
        field: String,
        reference: String,
    },

    #[error("record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("state record {index}: {reason}")]
    MalformedState { index: usize, reason: String },

    #[error("entity {entity} already exists")]
    DuplicateEntity { entity: EntityId },

    #[error("entity {entity} references missing parent {parent}")]
    DanglingParent { entity: EntityId, parent: EntityId },
}

/// Outcome of a document load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Ids of the loaded entities, in record order.
    pub loaded: Vec<EntityId>,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// Returns true if nothing was skipped or repaired.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Tracks serialized-to-live id mappings and pending StateField records
/// across the records of one load.
#[derive(Debug, Default)]
pub struct LoadContext {
    options: LoadOptions,
    pending_states: HashMap<StateId, StateRecord>,
    states: HashMap<StateId, StateId>,
    entities: HashMap<EntityId, EntityId>,
    issues: Vec<LoadIssue>,
}

impl LoadContext {
    #[must_use]
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Makes a StateField record available to entity records that reference it.
    pub fn add_state_record(&mut self, record: StateRecord) {
        self.pending_states.insert(record.id, record);
    }

    #[must_use]
    pub fn state_record(&self, serialized: StateId) -> Option<&StateRecord> {
        self.pending_states.get(&serialized)
    }

    /// Live id a serialized StateField id resolved to, if it has been loaded.
    #[must_use]
    pub fn resolved_state(&self, serialized: StateId) -> Option<StateId> {
        self.states.get(&serialized).copied()
    }

    pub fn register_state(&mut self, serialized: StateId, live: StateId) {
        self.states.insert(serialized, live);
    }

    /// Live id for a serialized StateField id: fresh when remapping.
    #[must_use]
    pub fn live_state_id(&self, serialized: StateId) -> StateId {
        if self.options.remap_ids {
            StateId::new()
        } else {
            serialized
        }
    }

    /// Live id for a serialized entity id. Stable across calls within one load.
    pub fn live_entity_id(&mut self, serialized: EntityId) -> EntityId {
        if !self.options.remap_ids {
            return serialized;
        }
        *self
            .entities
            .entry(serialized)
            .or_insert_with(EntityId::new)
    }

    pub fn issue(&mut self, issue: LoadIssue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Vec<LoadIssue> {
        std::mem::take(&mut self.issues)
    }
}
