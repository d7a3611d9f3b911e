//! The entity class trait.
//!
//! A class describes one entity kind: its field table, how a field change
//! maps to a dirty kind, how instances verify, dump and load. Derived kinds
//! reuse their parent's behavior by calling the parent's dump/load helpers
//! first and then handling their own fields.

use crate::document::Document;
use crate::entity::Entity;
use crate::field::{FieldSpec, FieldStorage};
use crate::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_types::{ClassTag, DirtyKinds, EntityId};
use serde_json::Value;
use std::fmt;

/// A field value change delivered to the owner's class.
#[derive(Debug, Clone, Copy)]
pub struct FieldChange<'a> {
    pub entity: EntityId,
    pub field: &'a str,
    pub old: &'a Value,
    pub new: &'a Value,
}

/// One failed verification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyFailure {
    pub entity: EntityId,
    pub class_tag: ClassTag,
    /// The offending field, or `None` for entity-level checks.
    pub field: Option<String>,
    pub reason: String,
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "{} {}.{}: {}",
                self.class_tag, self.entity, field, self.reason
            ),
            None => write!(f, "{} {}: {}", self.class_tag, self.entity, self.reason),
        }
    }
}

/// Behavior of one entity kind.
///
/// Implementors must be `Send + Sync` as classes are shared through the
/// registry. Only [`tag`](Self::tag) and [`fields`](Self::fields) are
/// required; the rest default to field-table driven behavior.
pub trait EntityClass: Send + Sync {
    /// Stable class tag written into dumps.
    fn tag(&self) -> &ClassTag;

    /// Full field table, parent class fields first.
    fn fields(&self) -> &[FieldSpec];

    /// Looks up one field declaration.
    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    /// Called for every committed change of a bound field.
    ///
    /// Returns the dirty kinds to raise on the owner; empty raises nothing.
    /// The default uses the field's declared `dirties` kind.
    fn on_field_changed(&self, change: &FieldChange<'_>) -> DirtyKinds {
        self.field(change.field)
            .and_then(|spec| spec.dirties)
            .map_or(DirtyKinds::empty(), DirtyKinds::from)
    }

    /// Checks the entity's invariants. Never modifies data.
    fn verify(&self, entity: &Entity, doc: &Document) -> Vec<VerifyFailure> {
        verify_fields(entity, doc, self.fields())
    }

    /// Dumps the entity. Derived classes call their parent's dump first.
    fn dump(&self, entity: &Entity, dumper: &mut Dumper<'_>) -> EntityRecord {
        let mut record = dumper.base_record(entity);
        dumper.write_fields(&mut record, entity, self.fields());
        record
    }

    /// Fills a constructed entity from its record. Derived classes call their
    /// parent's load first.
    fn load(
        &self,
        entity: &mut Entity,
        record: &EntityRecord,
        loader: &mut Loader<'_>,
    ) -> IoResult<()> {
        loader.read_base(entity, record);
        loader.read_fields(entity, record, self.fields());
        Ok(())
    }
}

/// Checks every declared field of `entity` against its constraint.
///
/// State-backed fields must be bound to an existing StateField that itself
/// verifies; scalars must be present and within their constraint.
#[must_use]
pub fn verify_fields(entity: &Entity, doc: &Document, specs: &[FieldSpec]) -> Vec<VerifyFailure> {
    let mut failures = Vec::new();
    let mut fail = |field: &str, reason: String| {
        failures.push(VerifyFailure {
            entity: entity.id(),
            class_tag: entity.class_tag().clone(),
            field: Some(field.to_string()),
            reason,
        });
    };

    for spec in specs {
        match spec.storage {
            FieldStorage::State => {
                let Some(state_id) = entity.state_id(spec.name) else {
                    fail(spec.name, "field is not bound".to_string());
                    continue;
                };
                let Some(state) = doc.states().get(state_id) else {
                    fail(spec.name, format!("state field {state_id} is missing"));
                    continue;
                };
                if let Err(reason) = state.verify() {
                    fail(spec.name, reason);
                } else if let Err(reason) = spec.constraint.check(state.value()) {
                    fail(spec.name, reason);
                }
            }
            FieldStorage::Scalar => match entity.scalar(spec.name) {
                None => fail(spec.name, "value is missing".to_string()),
                Some(value) => {
                    if let Err(reason) = spec.constraint.check(value) {
                        fail(spec.name, reason);
                    }
                }
            },
        }
    }
    failures
}
