//! The document: entities, their StateFields and dirty propagation.
//!
//! All field mutation goes through here. A value change is delivered to every
//! entity field bound to the changed StateField via the owner class's
//! [`EntityClass::on_field_changed`], and the dirty kinds it returns are raised
//! on the owner and its ancestors.

use crate::class::{EntityClass, FieldChange, VerifyFailure};
use crate::dirty::{DirtyEvent, DirtyObserver, GenerationToken};
use crate::entity::{Entity, EntityLifecycle};
use crate::error::{ModelError, ModelResult};
use crate::field::{FieldKey, FieldSpec, FieldStorage, values_nearly_equal};
use crate::registry::EntityRegistry;
use crate::state::{FieldBinding, StateArena, StateField};
use floorplan_types::{DirtyKinds, EntityFlags, EntityId, StateId};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy)]
enum Compare {
    /// Numbers within tolerance count as unchanged.
    Nearly,
    /// Bit-for-bit, used when restoring captured values.
    Exact,
}

impl Compare {
    fn same(self, a: &Value, b: &Value) -> bool {
        match self {
            Self::Nearly => values_nearly_equal(a, b),
            Self::Exact => a == b,
        }
    }
}

/// An open floorplan document.
pub struct Document {
    registry: Arc<EntityRegistry>,
    states: StateArena,
    entities: BTreeMap<EntityId, Entity>,
    batch_depth: u32,
    pending_dirty: BTreeMap<EntityId, DirtyKinds>,
    observers: Vec<Arc<dyn DirtyObserver>>,
}

impl Document {
    /// Creates an empty document over a populated registry.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self {
            registry,
            states: StateArena::new(),
            entities: BTreeMap::new(),
            batch_depth: 0,
            pending_dirty: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn states(&self) -> &StateArena {
        &self.states
    }

    // ── Entities ────────────────────────────────────────────────────

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities, removed ones included, in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities not marked removed.
    pub fn live_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| !e.is_removed())
    }

    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn entity_or_err(&self, id: EntityId) -> ModelResult<&Entity> {
        self.entities.get(&id).ok_or(ModelError::EntityNotFound(id))
    }

    fn entity_mut_or_err(&mut self, id: EntityId) -> ModelResult<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(ModelError::EntityNotFound(id))
    }

    /// Returns the class of an entity.
    pub fn class_of(&self, id: EntityId) -> ModelResult<Arc<dyn EntityClass>> {
        let entity = self.entity_or_err(id)?;
        self.registry.class(entity.class_tag().as_str())
    }

    /// Returns the declaration of one field of an entity.
    pub fn field_spec(&self, id: EntityId, field: &str) -> ModelResult<FieldSpec> {
        let class = self.class_of(id)?;
        class
            .field(field)
            .copied()
            .ok_or_else(|| ModelError::UnknownField {
                class: class.tag().clone(),
                field: field.to_string(),
            })
    }

    /// Creates an entity with every field at its default value.
    pub fn create_entity(&mut self, tag: &str) -> ModelResult<EntityId> {
        self.create_entity_with(tag, &Map::new(), None)
    }

    /// Creates an entity with the given initial values and parent.
    ///
    /// Every declared field gets a fresh StateField (or scalar); fields not
    /// named in `values` take their default. Nothing is created if any value
    /// is rejected.
    pub fn create_entity_with(
        &mut self,
        tag: &str,
        values: &Map<String, Value>,
        parent: Option<EntityId>,
    ) -> ModelResult<EntityId> {
        let class = self.registry.class(tag)?;
        let mut entity = self.registry.create(tag)?;
        let id = entity.id();

        if let Some(unknown) = values.keys().find(|k| class.field(k).is_none()) {
            return Err(ModelError::UnknownField {
                class: class.tag().clone(),
                field: unknown.clone(),
            });
        }
        if let Some(parent) = parent {
            self.entity_or_err(parent)?;
        }

        let mut resolved = Vec::with_capacity(class.fields().len());
        for spec in class.fields() {
            let value = match values.get(spec.name) {
                Some(value) => {
                    spec.constraint
                        .check(value)
                        .map_err(|reason| ModelError::InvalidValue {
                            entity: id,
                            field: spec.name.to_string(),
                            reason,
                        })?;
                    value.clone()
                }
                None => spec.default_value(),
            };
            resolved.push((spec, value));
        }

        for (spec, value) in resolved {
            match spec.storage {
                FieldStorage::State => {
                    let state_id = self
                        .states
                        .insert(StateField::new(value).with_constraint(spec.constraint))?;
                    entity.bind_state(spec.name, state_id);
                }
                FieldStorage::Scalar => {
                    entity.set_scalar(spec.name, value);
                }
            }
        }
        entity.set_parent(parent);
        self.attach(entity)
    }

    /// Attaches a constructed entity whose StateFields are already in the arena.
    pub(crate) fn attach(&mut self, mut entity: Entity) -> ModelResult<EntityId> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(ModelError::DuplicateEntity(id));
        }
        if let Some((_, missing)) = entity
            .state_bindings()
            .find(|(_, state_id)| !self.states.contains(*state_id))
        {
            return Err(ModelError::StateNotFound(missing));
        }
        for (field, state_id) in entity.state_bindings() {
            self.states.bind(state_id, FieldBinding::new(id, field))?;
        }
        entity.set_lifecycle(EntityLifecycle::Initialized);
        debug!(entity = %id, class_tag = %entity.class_tag(), "Attached entity");
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Drops an entity for good, releasing StateFields only it was bound to.
    ///
    /// Children of the purged entity lose their parent link.
    pub fn purge(&mut self, id: EntityId) -> ModelResult<Entity> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(ModelError::EntityNotFound(id))?;
        for (field, state_id) in entity.state_bindings() {
            self.states.unbind(state_id, &FieldBinding::new(id, field));
        }
        for child in self.entities.values_mut() {
            if child.parent() == Some(id) {
                child.set_parent(None);
            }
        }
        self.pending_dirty.remove(&id);
        debug!(entity = %id, "Purged entity");
        Ok(entity)
    }

    // ── Field values ────────────────────────────────────────────────

    /// Current value of a field.
    pub fn value(&self, id: EntityId, field: &str) -> ModelResult<&Value> {
        let entity = self.entity_or_err(id)?;
        if let Some(state_id) = entity.state_id(field) {
            return self
                .states
                .get(state_id)
                .map(StateField::value)
                .ok_or(ModelError::StateNotFound(state_id));
        }
        entity
            .scalar(field)
            .ok_or_else(|| ModelError::UnknownField {
                class: entity.class_tag().clone(),
                field: field.to_string(),
            })
    }

    /// Reads a field as a concrete type.
    pub fn get<T: DeserializeOwned>(&self, id: EntityId, key: FieldKey<T>) -> ModelResult<T> {
        let value = self.value(id, key.name())?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Id of the StateField a state-backed field is bound to.
    pub fn state_of(&self, id: EntityId, field: &str) -> ModelResult<StateId> {
        self.entity_or_err(id)?
            .state_id(field)
            .ok_or_else(|| ModelError::NotAStateField {
                entity: id,
                field: field.to_string(),
            })
    }

    /// Checks a candidate value against the field's constraint without writing it.
    pub fn validate_value(&self, id: EntityId, field: &str, value: &Value) -> ModelResult<()> {
        let spec = self.field_spec(id, field)?;
        spec.constraint
            .check(value)
            .map_err(|reason| ModelError::InvalidValue {
                entity: id,
                field: field.to_string(),
                reason,
            })
    }

    /// Sets a field after validating it. Returns false if the value is
    /// nearly equal to the current one, in which case nothing is notified.
    pub fn set_field(&mut self, id: EntityId, field: &str, value: Value) -> ModelResult<bool> {
        self.validate_value(id, field, &value)?;
        let spec = self.field_spec(id, field)?;
        self.write_field(id, &spec, value, Compare::Nearly)
    }

    /// Writes a previously captured value back, compared exactly and without
    /// validation, so undo restores values bit for bit.
    pub fn restore_field(&mut self, id: EntityId, field: &str, value: Value) -> ModelResult<bool> {
        let spec = self.field_spec(id, field)?;
        self.write_field(id, &spec, value, Compare::Exact)
    }

    /// Sets a StateField's value directly, notifying every bound field.
    pub fn set_state(&mut self, state_id: StateId, value: Value) -> ModelResult<bool> {
        let state = self
            .states
            .get(state_id)
            .ok_or(ModelError::StateNotFound(state_id))?;
        state
            .constraint()
            .check(&value)
            .map_err(|reason| ModelError::InvalidStateValue {
                state: state_id,
                reason,
            })?;
        self.write_state(state_id, value, Compare::Nearly)
    }

    /// Restores a StateField's value exactly.
    pub fn restore_state(&mut self, state_id: StateId, value: Value) -> ModelResult<bool> {
        self.write_state(state_id, value, Compare::Exact)
    }

    fn write_field(
        &mut self,
        id: EntityId,
        spec: &FieldSpec,
        value: Value,
        compare: Compare,
    ) -> ModelResult<bool> {
        match spec.storage {
            FieldStorage::State => {
                let state_id = self.state_of(id, spec.name)?;
                self.write_state(state_id, value, compare)
            }
            FieldStorage::Scalar => {
                let entity = self.entity_mut_or_err(id)?;
                let old = entity.scalar(spec.name).cloned().unwrap_or(Value::Null);
                if compare.same(&old, &value) {
                    return Ok(false);
                }
                entity.set_scalar(spec.name, value.clone());
                self.notify_field_changed(id, spec.name, &old, &value);
                Ok(true)
            }
        }
    }

    fn write_state(&mut self, state_id: StateId, value: Value, compare: Compare) -> ModelResult<bool> {
        let state = self
            .states
            .get_mut(state_id)
            .ok_or(ModelError::StateNotFound(state_id))?;
        if compare.same(state.value(), &value) {
            return Ok(false);
        }
        let old = state.replace(value.clone());
        let bindings = state.bindings().to_vec();
        for binding in &bindings {
            self.notify_field_changed(binding.owner, &binding.field, &old, &value);
        }
        Ok(true)
    }

    fn notify_field_changed(&mut self, owner: EntityId, field: &str, old: &Value, new: &Value) {
        let class = match self.class_of(owner) {
            Ok(class) => class,
            Err(e) => {
                warn!(entity = %owner, field, error = %e, "Dropping change notification");
                return;
            }
        };
        let change = FieldChange {
            entity: owner,
            field,
            old,
            new,
        };
        debug!(entity = %owner, field, "Field changed");
        let kinds = class.on_field_changed(&change);
        if !kinds.is_empty() {
            self.raise_dirty(owner, kinds);
        }
    }

    // ── Sharing ─────────────────────────────────────────────────────

    /// Rebinds a state-backed field to another existing StateField.
    ///
    /// Returns the previously bound StateField if this was its last binding
    /// and it was dropped from the arena. The owner is notified if the
    /// visible value changes.
    pub fn bind_field(
        &mut self,
        id: EntityId,
        field: &str,
        target: StateId,
    ) -> ModelResult<Option<StateField>> {
        let spec = self.field_spec(id, field)?;
        if !spec.is_state() {
            return Err(ModelError::NotAStateField {
                entity: id,
                field: field.to_string(),
            });
        }
        if !self.states.contains(target) {
            return Err(ModelError::StateNotFound(target));
        }
        let current = self.state_of(id, field)?;
        if current == target {
            return Ok(None);
        }

        let binding = FieldBinding::new(id, field);
        let old_value = self
            .states
            .get(current)
            .map_or(Value::Null, |s| s.value().clone());
        self.states.bind(target, binding.clone())?;
        self.entity_mut_or_err(id)?.bind_state(field, target);
        let released = self.states.unbind(current, &binding);
        let new_value = self
            .states
            .get(target)
            .map_or(Value::Null, |s| s.value().clone());

        debug!(entity = %id, field, from = %current, to = %target, "Rebound field");
        if old_value != new_value {
            self.notify_field_changed(id, field, &old_value, &new_value);
        }
        Ok(released)
    }

    /// Unbinds a field from a StateField it shares with other fields.
    ///
    /// The field moves to a fresh private StateField holding the same value,
    /// so nothing is notified. A field that is not shared keeps its
    /// StateField. Returns the id the field is bound to afterwards.
    pub fn unbind_field(&mut self, id: EntityId, field: &str) -> ModelResult<StateId> {
        let spec = self.field_spec(id, field)?;
        if !spec.is_state() {
            return Err(ModelError::NotAStateField {
                entity: id,
                field: field.to_string(),
            });
        }
        let current = self.state_of(id, field)?;
        let state = self.states.get(current).ok_or(ModelError::StateNotFound(current))?;
        if state.bindings().len() <= 1 {
            return Ok(current);
        }
        let private = StateField::new(state.value().clone()).with_constraint(spec.constraint);
        let private = self.states.insert(private)?;
        self.bind_field(id, field, private)?;
        debug!(entity = %id, field, from = %current, to = %private, "Unbound shared field");
        Ok(private)
    }

    /// Puts a previously released StateField back into the arena, unbound.
    /// The caller is expected to bind it right away.
    pub fn adopt_state(&mut self, state: StateField) -> ModelResult<StateId> {
        self.states.insert(state.detached())
    }

    pub(crate) fn insert_state(&mut self, state: StateField) -> ModelResult<StateId> {
        self.states.insert(state)
    }

    pub(crate) fn prune_unbound_states(&mut self) -> usize {
        self.states.prune_unbound()
    }

    // ── Flags and hierarchy ─────────────────────────────────────────

    /// Replaces an entity's flags. Returns the previous flags.
    pub fn set_flags(&mut self, id: EntityId, flags: EntityFlags) -> ModelResult<EntityFlags> {
        let entity = self.entity_mut_or_err(id)?;
        let old = entity.flags();
        if old != flags {
            entity.set_flags(flags);
            debug!(entity = %id, old = old.bits(), new = flags.bits(), "Flags changed");
            self.raise_dirty(id, DirtyKinds::DISPLAY);
        }
        Ok(old)
    }

    /// Turns one flag on or off. Returns true if the flags changed.
    pub fn set_flag(&mut self, id: EntityId, flag: EntityFlags, on: bool) -> ModelResult<bool> {
        let mut flags = self.entity_or_err(id)?.flags();
        flags.set(flag, on);
        let old = self.set_flags(id, flags)?;
        Ok(old != flags)
    }

    /// Marks an entity removed. It stays in the document until purged.
    pub fn mark_removed(&mut self, id: EntityId) -> ModelResult<bool> {
        self.set_flag(id, EntityFlags::REMOVED, true)
    }

    /// Clears the removed mark.
    pub fn resurrect(&mut self, id: EntityId) -> ModelResult<bool> {
        self.set_flag(id, EntityFlags::REMOVED, false)
    }

    /// Re-parents an entity. Returns the previous parent.
    pub fn set_parent(
        &mut self,
        id: EntityId,
        parent: Option<EntityId>,
    ) -> ModelResult<Option<EntityId>> {
        let old = self.entity_or_err(id)?.parent();
        if old == parent {
            return Ok(old);
        }
        if let Some(parent) = parent {
            self.entity_or_err(parent)?;
            if self.lineage(parent).contains(&id) {
                return Err(ModelError::ParentCycle(id));
            }
        }
        self.entity_mut_or_err(id)?.set_parent(parent);
        self.raise_dirty(id, DirtyKinds::POSITION);
        Ok(old)
    }

    /// Direct children of an entity.
    #[must_use]
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.parent() == Some(id))
            .map(Entity::id)
            .collect()
    }

    /// All descendants of an entity, breadth first.
    #[must_use]
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            for child in self.children(next) {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// The entity followed by its ancestors, nearest first.
    fn lineage(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if chain.contains(&current) || !self.entities.contains_key(&current) {
                break;
            }
            chain.push(current);
            cursor = self.entities.get(&current).and_then(Entity::parent);
        }
        chain
    }

    // ── Dirty propagation ───────────────────────────────────────────

    /// Registers an observer for dirty events.
    pub fn subscribe(&mut self, observer: Arc<dyn DirtyObserver>) {
        self.observers.push(observer);
    }

    /// Starts coalescing dirty marks. Batches nest.
    pub fn begin_dirty_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Ends a batch. The outermost end flushes every coalesced mark, bumping
    /// each affected entity's generation once. Returns how many entities
    /// were flushed.
    pub fn end_dirty_batch(&mut self) -> usize {
        if self.batch_depth == 0 {
            warn!("end_dirty_batch called without a matching begin");
            return 0;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending_dirty);
        self.flush_dirty(pending)
    }

    /// Runs `f` inside a dirty batch.
    pub fn batched<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_dirty_batch();
        let result = f(self);
        self.end_dirty_batch();
        result
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Dirties an entity explicitly.
    pub fn mark_dirty(&mut self, id: EntityId, kinds: DirtyKinds) -> ModelResult<()> {
        self.entity_or_err(id)?;
        self.raise_dirty(id, kinds);
        Ok(())
    }

    /// Clears and returns an entity's pending dirty kinds.
    pub fn mark_clean(&mut self, id: EntityId) -> ModelResult<DirtyKinds> {
        Ok(self.entity_mut_or_err(id)?.dirty_mut().take())
    }

    #[must_use]
    pub fn dirty_generation(&self, id: EntityId) -> Option<u64> {
        self.entities.get(&id).map(|e| e.dirty().generation())
    }

    #[must_use]
    pub fn generation_token(&self, id: EntityId) -> Option<GenerationToken> {
        self.dirty_generation(id).map(|generation| GenerationToken {
            entity: id,
            generation,
        })
    }

    fn raise_dirty(&mut self, id: EntityId, kinds: DirtyKinds) {
        if self.batch_depth > 0 {
            *self.pending_dirty.entry(id).or_default() |= kinds;
            return;
        }
        self.flush_dirty(BTreeMap::from([(id, kinds)]));
    }

    fn flush_dirty(&mut self, marks: BTreeMap<EntityId, DirtyKinds>) -> usize {
        let mut combined: BTreeMap<EntityId, DirtyKinds> = BTreeMap::new();
        for (id, kinds) in marks {
            for entity in self.lineage(id) {
                *combined.entry(entity).or_default() |= kinds;
            }
        }

        let mut events = Vec::with_capacity(combined.len());
        for (id, kinds) in combined {
            if let Some(entity) = self.entities.get_mut(&id) {
                let generation = entity.dirty_mut().mark(kinds);
                events.push(DirtyEvent {
                    entity: id,
                    kinds,
                    generation,
                });
            }
        }
        for event in &events {
            for observer in &self.observers {
                observer.on_dirty(event);
            }
        }
        events.len()
    }

    // ── Verification ────────────────────────────────────────────────

    /// Runs the class's checks and returns every failure.
    pub fn verify_report(&self, id: EntityId) -> ModelResult<Vec<VerifyFailure>> {
        let entity = self.entity_or_err(id)?;
        let class = self.class_of(id)?;
        Ok(class.verify(entity, self))
    }

    /// Verifies an entity, logging each failure. Never modifies data.
    #[must_use]
    pub fn verify(&self, id: EntityId) -> bool {
        match self.verify_report(id) {
            Ok(failures) if failures.is_empty() => true,
            Ok(failures) => {
                for failure in &failures {
                    error!(
                        entity = %failure.entity,
                        class_tag = %failure.class_tag,
                        field = failure.field.as_deref().unwrap_or("-"),
                        reason = %failure.reason,
                        "Verification failed"
                    );
                }
                false
            }
            Err(e) => {
                error!(entity = %id, error = %e, "Verification failed");
                false
            }
        }
    }

    /// Verifies every live entity.
    #[must_use]
    pub fn verify_all(&self) -> Vec<VerifyFailure> {
        self.live_entities()
            .filter_map(|e| self.verify_report(e.id()).ok())
            .flatten()
            .collect()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("entities", &self.entities.len())
            .field("states", &self.states.len())
            .field("batch_depth", &self.batch_depth)
            .finish_non_exhaustive()
    }
}
