//! Snapshots of entity state for exact restoration.
//!
//! A snapshot is a complete dump (defaults and removed entities included) of
//! a set of entities. Restoring it rebinds every state-backed field to the
//! StateField it referenced at capture time, re-adopting StateFields that
//! have since been released, then writes captured values back exactly.
//! Entities missing from the document are loaded from their record.

use super::context::{LoadContext, LoadOptions};
use super::dump::{DumpOptions, Dumper};
use super::load::load_entity;
use super::record::{EntityRecord, StateRecord};
use super::IoResult;
use crate::document::Document;
use crate::field::FieldStorage;
use floorplan_types::{EntityId, StateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Captured state of a set of entities and every StateField they reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entities: Vec<EntityRecord>,
    pub states: Vec<StateRecord>,
}

impl Snapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|r| r.id == id)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|r| r.id)
    }
}

/// Captures the given entities.
pub fn capture_snapshot(doc: &Document, ids: &[EntityId]) -> IoResult<Snapshot> {
    let mut dumper = Dumper::new(doc, DumpOptions::complete());
    let entities = ids
        .iter()
        .map(|id| dumper.dump_entity(*id))
        .collect::<IoResult<Vec<_>>>()?;
    Ok(Snapshot {
        entities,
        states: dumper.into_states(),
    })
}

/// Restores a snapshot into the document.
pub fn restore_snapshot(doc: &mut Document, snapshot: &Snapshot) -> IoResult<()> {
    let states: HashMap<StateId, &StateRecord> =
        snapshot.states.iter().map(|s| (s.id, s)).collect();
    let mut ctx = LoadContext::new(LoadOptions::default());
    for state in &snapshot.states {
        ctx.add_state_record(state.clone());
    }

    let (present, missing): (Vec<_>, Vec<_>) =
        snapshot.entities.iter().partition(|r| doc.contains(r.id));
    for record in missing {
        debug!(entity = %record.id, "Reloading entity from snapshot");
        load_entity(doc, record, &mut ctx)?;
    }
    for record in present {
        restore_entity(doc, record, &states)?;
    }

    for state in &snapshot.states {
        if doc.states().contains(state.id) {
            doc.restore_state(state.id, state.value.clone())?;
        }
    }
    Ok(())
}

fn restore_entity(
    doc: &mut Document,
    record: &EntityRecord,
    states: &HashMap<StateId, &StateRecord>,
) -> IoResult<()> {
    let id = record.id;
    let class = doc.class_of(id)?;

    doc.set_flags(id, record.flags)?;
    match record.parent {
        Some(parent) if !doc.contains(parent) => {
            warn!(entity = %id, %parent, "Snapshot parent no longer exists, detaching");
            doc.set_parent(id, None)?;
        }
        parent => {
            doc.set_parent(id, parent)?;
        }
    }

    for spec in class.fields() {
        match spec.storage {
            FieldStorage::State => {
                let Some(target) = record.state_ref(spec.name) else {
                    continue;
                };
                if !doc.states().contains(target) {
                    let Some(state) = states.get(&target) else {
                        warn!(entity = %id, field = spec.name, state = %target, "Snapshot state field missing");
                        continue;
                    };
                    doc.adopt_state(state.to_state(target).with_constraint(spec.constraint))?;
                }
                doc.bind_field(id, spec.name, target)?;
            }
            FieldStorage::Scalar => {
                if let Some(value) = record.field(spec.name) {
                    doc.restore_field(id, spec.name, value.clone())?;
                }
            }
        }
    }
    Ok(())
}
