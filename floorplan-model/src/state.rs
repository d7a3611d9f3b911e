//! StateFields and the arena that owns them.
//!
//! A [`StateField`] is a uniquely identified value that one or more entity
//! fields are bound to. Sharing a StateField between two entities makes a
//! change through one visible through the other; dumps write the value once
//! under the StateField's id and entity records reference that id.
//!
//! Values are only replaced through [`Document`](crate::Document), which
//! notifies every binding. The arena exposes read access publicly and keeps
//! mutation crate-private.

use crate::error::{ModelError, ModelResult};
use crate::field::Constraint;
use floorplan_types::{EntityId, StateId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default display name of a StateField.
pub(crate) const DEFAULT_STATE_NAME: &str = "Default";

/// One (owner, field name) pair bound to a StateField.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldBinding {
    pub owner: EntityId,
    pub field: String,
}

impl FieldBinding {
    #[must_use]
    pub fn new(owner: EntityId, field: impl Into<String>) -> Self {
        Self {
            owner,
            field: field.into(),
        }
    }
}

/// A uniquely identified, shareable value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateField {
    id: StateId,
    value: Value,
    name: String,
    local_id: String,
    editable: bool,
    persistable: bool,
    constraint: Constraint,
    bindings: Vec<FieldBinding>,
}

impl StateField {
    /// Creates a StateField with a fresh id.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self::with_id(StateId::new(), value)
    }

    /// Creates a StateField with the given id (used when loading).
    #[must_use]
    pub fn with_id(id: StateId, value: Value) -> Self {
        Self {
            id,
            value,
            name: DEFAULT_STATE_NAME.to_string(),
            local_id: String::new(),
            editable: false,
            persistable: true,
            constraint: Constraint::Any,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = local_id.into();
        self
    }

    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Non-persistable fields are skipped by dumps and fail verification.
    #[must_use]
    pub fn persistable(mut self, persistable: bool) -> Self {
        self.persistable = persistable;
        self
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    #[must_use]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Reads the value as a concrete type.
    pub fn get<T: DeserializeOwned>(&self) -> ModelResult<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.persistable
    }

    #[must_use]
    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    #[must_use]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Returns true if more than one entity field is bound.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.bindings.len() > 1
    }

    /// Checks the value is present, persistable and within its constraint.
    ///
    /// # Errors
    ///
    /// Returns the reason verification failed.
    pub fn verify(&self) -> Result<(), String> {
        if self.value.is_null() {
            return Err("value is null".to_string());
        }
        if !self.persistable {
            return Err("field is not persistable".to_string());
        }
        self.constraint.check(&self.value)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Returns a copy with no bindings, as stored in snapshots.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            bindings: Vec::new(),
            ..self.clone()
        }
    }

    /// Replaces the value and returns the previous one. Callers notify bindings.
    pub(crate) fn replace(&mut self, value: Value) -> Value {
        std::mem::replace(&mut self.value, value)
    }

    /// Adds a binding. Binding the same pair twice is a no-op.
    pub(crate) fn bind(&mut self, binding: FieldBinding) -> bool {
        if self.bindings.contains(&binding) {
            return false;
        }
        self.bindings.push(binding);
        true
    }

    pub(crate) fn unbind(&mut self, binding: &FieldBinding) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b != binding);
        self.bindings.len() != before
    }
}

/// Owner of every StateField in a document, keyed by id.
///
/// A StateField lives here exactly as long as at least one entity field is
/// bound to it.
#[derive(Debug, Clone, Default)]
pub struct StateArena {
    fields: HashMap<StateId, StateField>,
}

impl StateArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: StateId) -> bool {
        self.fields.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: StateId) -> Option<&StateField> {
        self.fields.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateField> {
        self.fields.values()
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> Option<&mut StateField> {
        self.fields.get_mut(&id)
    }

    /// Inserts an unbound StateField.
    pub(crate) fn insert(&mut self, field: StateField) -> ModelResult<StateId> {
        let id = field.id;
        if self.fields.contains_key(&id) {
            return Err(ModelError::DuplicateState(id));
        }
        self.fields.insert(id, field);
        Ok(id)
    }

    pub(crate) fn bind(&mut self, id: StateId, binding: FieldBinding) -> ModelResult<()> {
        let field = self
            .fields
            .get_mut(&id)
            .ok_or(ModelError::StateNotFound(id))?;
        field.bind(binding);
        Ok(())
    }

    /// Removes a binding. Returns the StateField if it was its last binding,
    /// in which case the field is dropped from the arena.
    pub(crate) fn unbind(&mut self, id: StateId, binding: &FieldBinding) -> Option<StateField> {
        let field = self.fields.get_mut(&id)?;
        field.unbind(binding);
        if field.bindings.is_empty() {
            self.fields.remove(&id)
        } else {
            None
        }
    }

    /// Drops every StateField nobody is bound to. Returns how many were dropped.
    pub(crate) fn prune_unbound(&mut self) -> usize {
        let before = self.fields.len();
        self.fields.retain(|_, f| !f.bindings.is_empty());
        before - self.fields.len()
    }
}
