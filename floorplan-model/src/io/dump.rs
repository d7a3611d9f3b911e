//! Dumping entities and documents to records.

use super::record::{DocumentRecord, EntityRecord, FORMAT_VERSION, StateRecord};
use super::IoResult;
use crate::document::Document;
use crate::entity::Entity;
use crate::error::ModelError;
use crate::field::{FieldSpec, FieldStorage};
use floorplan_types::{EntityId, StateId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Options controlling what a dump contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    /// Write fields that still hold their default value.
    pub include_defaults: bool,
    /// Include entities marked removed.
    pub include_removed: bool,
}

impl DumpOptions {
    /// Everything, as needed to restore entities exactly.
    #[must_use]
    pub const fn complete() -> Self {
        Self {
            include_defaults: true,
            include_removed: true,
        }
    }
}

/// Accumulates entity records and the StateFields they reference.
pub struct Dumper<'a> {
    doc: &'a Document,
    options: DumpOptions,
    states: BTreeMap<StateId, StateRecord>,
}

impl<'a> Dumper<'a> {
    #[must_use]
    pub fn new(doc: &'a Document, options: DumpOptions) -> Self {
        Self {
            doc,
            options,
            states: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    #[must_use]
    pub fn options(&self) -> DumpOptions {
        self.options
    }

    /// Record with the fixed keys every entity carries.
    #[must_use]
    pub fn base_record(&self, entity: &Entity) -> EntityRecord {
        let mut record = EntityRecord::new(entity.class_tag().clone(), entity.id());
        record.flags = entity.flags();
        record.parent = entity.parent();
        record
    }

    /// Writes the given fields of `entity` into `record`.
    ///
    /// State-backed fields are written as StateField references and the
    /// referenced StateField is queued for the state table. Fields at their
    /// default are skipped unless `include_defaults` is set or the StateField
    /// is shared, since a shared binding must survive the round trip.
    pub fn write_fields(&mut self, record: &mut EntityRecord, entity: &Entity, specs: &[FieldSpec]) {
        for spec in specs {
            match spec.storage {
                FieldStorage::State => self.write_state_field(record, entity, spec),
                FieldStorage::Scalar => {
                    let value = entity.scalar(spec.name).cloned().unwrap_or(Value::Null);
                    if !self.options.include_defaults && value == spec.default_value() {
                        continue;
                    }
                    record.fields.insert(spec.name.to_string(), value);
                }
            }
        }
    }

    fn write_state_field(&mut self, record: &mut EntityRecord, entity: &Entity, spec: &FieldSpec) {
        let Some(state_id) = entity.state_id(spec.name) else {
            return;
        };
        let doc = self.doc;
        let Some(state) = doc.states().get(state_id) else {
            error!(entity = %entity.id(), field = spec.name, state = %state_id, "Bound state field missing from arena");
            return;
        };
        if !state.is_persistable() {
            return;
        }
        if !self.options.include_defaults
            && !state.is_shared()
            && *state.value() == spec.default_value()
        {
            return;
        }
        if let Err(reason) = state.verify() {
            error!(entity = %entity.id(), field = spec.name, %reason, "Dumping state field that fails verification");
        }
        record
            .fields
            .insert(spec.name.to_string(), Value::String(state_id.to_string()));
        self.states
            .entry(state_id)
            .or_insert_with(|| StateRecord::from_state(state));
    }

    /// Dumps one entity through its class.
    pub fn dump_entity(&mut self, id: EntityId) -> IoResult<EntityRecord> {
        let doc = self.doc;
        let class = doc.class_of(id)?;
        let entity = doc
            .entity(id)
            .ok_or(ModelError::EntityNotFound(id))?;
        Ok(class.dump(entity, self))
    }

    /// Consumes the dumper, returning the referenced StateFields in id order.
    #[must_use]
    pub fn into_states(self) -> Vec<StateRecord> {
        self.states.into_values().collect()
    }
}

/// Dumps a single entity and the StateFields it references.
pub fn dump_entity(
    doc: &Document,
    id: EntityId,
    options: DumpOptions,
) -> IoResult<(EntityRecord, Vec<StateRecord>)> {
    let mut dumper = Dumper::new(doc, options);
    let record = dumper.dump_entity(id)?;
    Ok((record, dumper.into_states()))
}

/// Dumps every entity of a document (removed ones only when asked).
pub fn dump_document(doc: &Document, options: DumpOptions) -> IoResult<DocumentRecord> {
    let mut dumper = Dumper::new(doc, options);
    let mut entities = Vec::with_capacity(doc.len());
    for entity in doc.entities() {
        if entity.is_removed() && !options.include_removed {
            continue;
        }
        let record = dumper.dump_entity(entity.id())?;
        entities.push(serde_json::to_value(record)?);
    }
    let states = dumper
        .into_states()
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(entities = entities.len(), states = states.len(), "Dumped document");
    Ok(DocumentRecord {
        version: FORMAT_VERSION,
        entities,
        states,
    })
}
