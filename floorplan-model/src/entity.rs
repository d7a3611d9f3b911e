//! Entity instances.

use crate::dirty::DirtyState;
use floorplan_types::{ClassTag, EntityFlags, EntityId, StateId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Where an entity is in its lifecycle.
///
/// Removal is not a lifecycle stage: it is the `REMOVED` flag, so that a
/// removed entity keeps its state and can be resurrected by undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLifecycle {
    /// Created by the registry, fields not yet bound.
    Constructed,
    /// Attached to a document with every declared field bound.
    Initialized,
}

/// One instance of a registered entity class.
///
/// An entity holds its identity, flags and parent link, the ids of the
/// StateFields its state-backed fields are bound to, and its scalar values.
/// All mutation goes through [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    class_tag: ClassTag,
    flags: EntityFlags,
    parent: Option<EntityId>,
    states: BTreeMap<String, StateId>,
    scalars: Map<String, Value>,
    lifecycle: EntityLifecycle,
    dirty: DirtyState,
}

impl Entity {
    pub(crate) fn new(id: EntityId, class_tag: ClassTag) -> Self {
        Self {
            id,
            class_tag,
            flags: EntityFlags::empty(),
            parent: None,
            states: BTreeMap::new(),
            scalars: Map::new(),
            lifecycle: EntityLifecycle::Constructed,
            dirty: DirtyState::fresh(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn class_tag(&self) -> &ClassTag {
        &self.class_tag
    }

    #[must_use]
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    #[must_use]
    pub fn is_flag_on(&self, flag: EntityFlags) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.is_removed()
    }

    #[must_use]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Id of the StateField bound to `field`, if it is a state-backed field.
    #[must_use]
    pub fn state_id(&self, field: &str) -> Option<StateId> {
        self.states.get(field).copied()
    }

    /// Iterates over (field name, StateField id) pairs.
    pub fn state_bindings(&self) -> impl Iterator<Item = (&str, StateId)> {
        self.states.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        self.scalars.get(field)
    }

    #[must_use]
    pub fn lifecycle(&self) -> EntityLifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn dirty(&self) -> &DirtyState {
        &self.dirty
    }

    pub(crate) fn set_flags(&mut self, flags: EntityFlags) {
        self.flags = flags;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    /// Records the StateField a field is bound to. Returns the previous binding.
    pub(crate) fn bind_state(&mut self, field: &str, id: StateId) -> Option<StateId> {
        self.states.insert(field.to_string(), id)
    }

    pub(crate) fn set_scalar(&mut self, field: &str, value: Value) -> Option<Value> {
        self.scalars.insert(field.to_string(), value)
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: EntityLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn dirty_mut(&mut self) -> &mut DirtyState {
        &mut self.dirty
    }
}
