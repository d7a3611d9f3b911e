//! Content: the base of every placeable object.

use crate::chain::FieldChain;
use crate::tags;
use floorplan_model::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_model::{
    Constraint, Document, Entity, EntityClass, FieldDefault, FieldKey, FieldSpec, VerifyFailure,
    verify_fields,
};
use floorplan_types::{ClassTag, DirtyKind};

pub const X: FieldKey<f64> = FieldKey::new("x");
pub const Y: FieldKey<f64> = FieldKey::new("y");
pub const Z: FieldKey<f64> = FieldKey::new("z");
pub const X_LENGTH: FieldKey<f64> = FieldKey::new("XLength");
pub const Y_LENGTH: FieldKey<f64> = FieldKey::new("YLength");
pub const Z_LENGTH: FieldKey<f64> = FieldKey::new("ZLength");
pub const ROTATION: FieldKey<f64> = FieldKey::new("Rotation");
pub const MATERIAL: FieldKey<String> = FieldKey::new("Material");
pub const SEEK_ID: FieldKey<String> = FieldKey::new("seekId");

const fn position(name: &'static str) -> FieldSpec {
    FieldSpec::state(name, FieldDefault::Number(0.0))
        .constrained(Constraint::Number)
        .dirties(DirtyKind::Position)
}

const fn length(name: &'static str, default: f64) -> FieldSpec {
    FieldSpec::state(name, FieldDefault::Number(default))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry)
}

pub const CONTENT_FIELDS: &[FieldSpec] = &[
    position("x"),
    position("y"),
    position("z"),
    length("XLength", 100.0),
    length("YLength", 100.0),
    length("ZLength", 100.0),
    FieldSpec::state("Rotation", FieldDefault::Number(0.0))
        .constrained(Constraint::Range {
            min: 0.0,
            max: 360.0,
        })
        .dirties(DirtyKind::Position),
    FieldSpec::state("Material", FieldDefault::Text("default"))
        .constrained(Constraint::Text)
        .dirties(DirtyKind::Material),
    // Catalog reference, carried verbatim.
    FieldSpec::scalar("seekId", FieldDefault::Text("")).constrained(Constraint::Text),
];

const TABLES: &[&[FieldSpec]] = &[CONTENT_FIELDS];

/// Plain content with no parametric behavior of its own.
pub struct ContentClass {
    tag: ClassTag,
    chain: FieldChain,
}

impl ContentClass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static(tags::CONTENT),
            chain: FieldChain::new(TABLES),
        }
    }
}

impl Default for ContentClass {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityClass for ContentClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        self.chain.fields()
    }

    fn verify(&self, entity: &Entity, doc: &Document) -> Vec<VerifyFailure> {
        verify_content(entity, doc, self.fields())
    }

    fn dump(&self, entity: &Entity, dumper: &mut Dumper<'_>) -> EntityRecord {
        self.chain.dump(entity, dumper)
    }

    fn load(
        &self,
        entity: &mut Entity,
        record: &EntityRecord,
        loader: &mut Loader<'_>,
    ) -> IoResult<()> {
        self.chain.load(entity, record, loader)
    }
}

/// Field checks plus the checks every content kind shares: a live content
/// must not sit under a removed parent.
#[must_use]
pub fn verify_content(entity: &Entity, doc: &Document, fields: &[FieldSpec]) -> Vec<VerifyFailure> {
    let mut failures = verify_fields(entity, doc, fields);
    if let Some(parent) = entity.parent().and_then(|p| doc.entity(p))
        && parent.is_removed()
        && !entity.is_removed()
    {
        failures.push(VerifyFailure {
            entity: entity.id(),
            class_tag: entity.class_tag().clone(),
            field: None,
            reason: format!("parent {} is removed", parent.id()),
        });
    }
    failures
}

/// Entity-level failure on one field.
pub(crate) fn field_failure(entity: &Entity, field: &str, reason: String) -> VerifyFailure {
    VerifyFailure {
        entity: entity.id(),
        class_tag: entity.class_tag().clone(),
        field: Some(field.to_string()),
        reason,
    }
}
