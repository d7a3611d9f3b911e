//! Parametric boxes.

use crate::chain::FieldChain;
use crate::content::{CONTENT_FIELDS, X_LENGTH, Y_LENGTH, field_failure, verify_content};
use crate::tags;
use floorplan_model::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_model::{
    Constraint, Document, Entity, EntityClass, FieldDefault, FieldKey, FieldSpec, VerifyFailure,
};
use floorplan_types::{ClassTag, DirtyKind};

pub const CORNER_RADIUS: FieldKey<f64> = FieldKey::new("CornerRadius");
pub const SHAPE: FieldKey<String> = FieldKey::new("Shape");

pub const PBOX_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("CornerRadius", FieldDefault::Number(0.0))
        .constrained(Constraint::NonNegative)
        .dirties(DirtyKind::Geometry),
    FieldSpec::scalar("Shape", FieldDefault::Text("box")).constrained(Constraint::Text),
];

const TABLES: &[&[FieldSpec]] = &[CONTENT_FIELDS, PBOX_FIELDS];

/// A box whose dimensions drive its geometry directly.
pub struct PBoxClass {
    tag: ClassTag,
    chain: FieldChain,
}

impl PBoxClass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static(tags::PBOX),
            chain: FieldChain::new(TABLES),
        }
    }
}

impl Default for PBoxClass {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityClass for PBoxClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        self.chain.fields()
    }

    fn verify(&self, entity: &Entity, doc: &Document) -> Vec<VerifyFailure> {
        verify_pbox(entity, doc, self.fields())
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

/// Content checks plus: rounded corners must fit the footprint.
#[must_use]
pub fn verify_pbox(entity: &Entity, doc: &Document, fields: &[FieldSpec]) -> Vec<VerifyFailure> {
    let mut failures = verify_content(entity, doc, fields);
    let id = entity.id();
    if let (Ok(radius), Ok(x), Ok(y)) = (
        doc.get(id, CORNER_RADIUS),
        doc.get(id, X_LENGTH),
        doc.get(id, Y_LENGTH),
    ) && radius * 2.0 > x.min(y)
    {
        failures.push(field_failure(
            entity,
            CORNER_RADIUS.name(),
            format!("radius {radius} does not fit a {x} x {y} footprint"),
        ));
    }
    failures
}
