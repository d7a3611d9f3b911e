//! Loading records into a document.
//!
//! A document loads in two passes: the state table first, so that every
//! StateField record is known, then the entity records, each of which
//! resolves its field references through the [`LoadContext`]. The first
//! entity to reference a StateField creates it; later ones bind to it.

use super::context::{LoadContext, LoadIssue, LoadOptions, LoadReport};
use super::record::{DocumentRecord, EntityRecord, FORMAT_VERSION, StateRecord};
use super::{IoError, IoResult};
use crate::document::Document;
use crate::entity::Entity;
use crate::error::ModelError;
use crate::field::{FieldSpec, FieldStorage};
use crate::state::StateField;
use floorplan_types::{EntityId, StateId};
use serde_json::Value;
use tracing::{debug, warn};

/// Hands out document access and id resolution to class `load` hooks.
pub struct Loader<'a> {
    doc: &'a mut Document,
    ctx: &'a mut LoadContext,
}

impl<'a> Loader<'a> {
    pub fn new(doc: &'a mut Document, ctx: &'a mut LoadContext) -> Self {
        Self { doc, ctx }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn context(&mut self) -> &mut LoadContext {
        self.ctx
    }

    /// Reads the fixed keys: flags and parent.
    pub fn read_base(&mut self, entity: &mut Entity, record: &EntityRecord) {
        entity.set_flags(record.flags);
        entity.set_parent(record.parent.map(|p| self.ctx.live_entity_id(p)));
    }

    /// Reads the given fields. Missing fields take their default.
    pub fn read_fields(&mut self, entity: &mut Entity, record: &EntityRecord, specs: &[FieldSpec]) {
        for spec in specs {
            match spec.storage {
                FieldStorage::State => {
                    let state_id = self.resolve_state(entity.id(), spec, record.field(spec.name));
                    entity.bind_state(spec.name, state_id);
                }
                FieldStorage::Scalar => {
                    let value = record
                        .field(spec.name)
                        .cloned()
                        .unwrap_or_else(|| spec.default_value());
                    entity.set_scalar(spec.name, value);
                }
            }
        }
    }

    fn resolve_state(&mut self, owner: EntityId, spec: &FieldSpec, raw: Option<&Value>) -> StateId {
        let reference = match raw {
            None => return self.fresh_state(spec, spec.default_value()),
            Some(Value::String(reference)) => reference,
            // Inline values from older dumps.
            Some(inline) => return self.fresh_state(spec, inline.clone()),
        };

        let Ok(serialized) = StateId::parse(reference) else {
            self.report_bad_reference(owner, spec, reference);
            return self.fresh_state(spec, spec.default_value());
        };
        if let Some(live) = self.ctx.resolved_state(serialized) {
            return live;
        }
        if !self.ctx.options().remap_ids && self.doc.states().contains(serialized) {
            self.ctx.register_state(serialized, serialized);
            return serialized;
        }

        let live = self.ctx.live_state_id(serialized);
        let state = match self.ctx.state_record(serialized).map(|r| r.to_state(live)) {
            Some(state) => state,
            None => {
                self.report_bad_reference(owner, spec, reference);
                StateField::with_id(live, spec.default_value())
            }
        };
        self.insert(state.with_constraint(spec.constraint));
        self.ctx.register_state(serialized, live);
        live
    }

    fn fresh_state(&mut self, spec: &FieldSpec, value: Value) -> StateId {
        let state = StateField::new(value).with_constraint(spec.constraint);
        let id = state.id();
        self.insert(state);
        id
    }

    fn insert(&mut self, state: StateField) {
        let id = state.id();
        if let Err(e) = self.doc.insert_state(state) {
            warn!(state = %id, error = %e, "Could not insert loaded state field");
        }
    }

    fn report_bad_reference(&mut self, owner: EntityId, spec: &FieldSpec, reference: &str) {
        warn!(entity = %owner, field = spec.name, reference, "Unresolved state field reference, using default");
        self.ctx.issue(LoadIssue::InvalidStateReference {
            entity: owner,
            field: spec.name.to_string(),
            reference: reference.to_string(),
        });
    }
}

/// Loads one entity record through its class and attaches it.
///
/// # Errors
///
/// `UnknownEntityType` if the class tag is not registered and
/// `DuplicateEntity` if the (possibly remapped) id is already taken.
pub fn load_entity(
    doc: &mut Document,
    record: &EntityRecord,
    ctx: &mut LoadContext,
) -> IoResult<EntityId> {
    let class = doc.registry().class(record.class_tag.as_str())?;
    let id = ctx.live_entity_id(record.id);
    if doc.contains(id) {
        return Err(ModelError::DuplicateEntity(id).into());
    }
    let mut entity = doc.registry().create_with_id(record.class_tag.as_str(), id)?;
    {
        let mut loader = Loader::new(doc, ctx);
        class.load(&mut entity, record, &mut loader)?;
    }
    Ok(doc.attach(entity)?)
}

/// Parses and loads one raw entity record.
pub fn load_entity_value(
    doc: &mut Document,
    value: &Value,
    ctx: &mut LoadContext,
) -> IoResult<EntityId> {
    let record: EntityRecord = serde_json::from_value(value.clone())
        .map_err(|e| IoError::MalformedRecord(e.to_string()))?;
    load_entity(doc, &record, ctx)
}

/// Loads a dumped document into `doc`, skipping what cannot be loaded.
///
/// # Errors
///
/// Only errors that are not attributable to a single record are returned;
/// per-record problems end up in the report.
pub fn load_document(
    doc: &mut Document,
    record: &DocumentRecord,
    options: LoadOptions,
) -> IoResult<LoadReport> {
    if record.version > FORMAT_VERSION {
        warn!(
            version = record.version,
            supported = FORMAT_VERSION,
            "Loading document written by a newer version"
        );
    }
    let mut ctx = LoadContext::new(options);

    for (index, raw) in record.states.iter().enumerate() {
        match serde_json::from_value::<StateRecord>(raw.clone()) {
            Ok(state) => ctx.add_state_record(state),
            Err(e) => ctx.issue(LoadIssue::MalformedState {
                index,
                reason: e.to_string(),
            }),
        }
    }

    let mut loaded = Vec::with_capacity(record.entities.len());
    for (index, raw) in record.entities.iter().enumerate() {
        match load_entity_value(doc, raw, &mut ctx) {
            Ok(id) => loaded.push(id),
            Err(IoError::Model(ModelError::UnknownEntityType(class_tag))) => {
                warn!(index, %class_tag, "Skipping record of unknown entity type");
                ctx.issue(LoadIssue::UnknownEntityType { index, class_tag });
            }
            Err(IoError::Model(ModelError::DuplicateEntity(entity))) => {
                warn!(index, %entity, "Skipping duplicate entity");
                ctx.issue(LoadIssue::DuplicateEntity { entity });
            }
            Err(IoError::MalformedRecord(reason)) => {
                warn!(index, %reason, "Skipping malformed record");
                ctx.issue(LoadIssue::MalformedRecord { index, reason });
            }
            Err(e) => return Err(e),
        }
    }

    for id in &loaded {
        let Some(parent) = doc.entity(*id).and_then(Entity::parent) else {
            continue;
        };
        if !doc.contains(parent) {
            ctx.issue(LoadIssue::DanglingParent {
                entity: *id,
                parent,
            });
            doc.set_parent(*id, None)?;
        }
    }

    let pruned = doc.prune_unbound_states();
    debug!(
        loaded = loaded.len(),
        pruned_states = pruned,
        issues = ctx.issues().len(),
        "Document load finished"
    );
    Ok(LoadReport {
        loaded,
        issues: ctx.take_issues(),
    })
}
