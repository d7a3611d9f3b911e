//! Moldings: boxes swept along a profile.

use crate::chain::FieldChain;
use crate::content::{CONTENT_FIELDS, Z_LENGTH, field_failure};
use crate::pbox::{PBOX_FIELDS, verify_pbox};
use crate::tags;
use floorplan_model::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_model::{
    Constraint, Document, Entity, EntityClass, FieldDefault, FieldKey, FieldSpec, VerifyFailure,
};
use floorplan_types::{ClassTag, DirtyKind};

pub const PROFILE_WIDTH: FieldKey<f64> = FieldKey::new("ProfileWidth");
pub const PROFILE_HEIGHT: FieldKey<f64> = FieldKey::new("ProfileHeight");
pub const PROFILE_ID: FieldKey<String> = FieldKey::new("ProfileId");

pub const MOLDING_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("ProfileWidth", FieldDefault::Number(2.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("ProfileHeight", FieldDefault::Number(8.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::scalar("ProfileId", FieldDefault::Text("")).constrained(Constraint::Text),
];

const TABLES: &[&[FieldSpec]] = &[CONTENT_FIELDS, PBOX_FIELDS, MOLDING_FIELDS];

pub struct MoldingClass {
    tag: ClassTag,
    chain: FieldChain,
}

impl MoldingClass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static(tags::MOLDING),
            chain: FieldChain::new(TABLES),
        }
    }
}

impl Default for MoldingClass {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityClass for MoldingClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        self.chain.fields()
    }

    fn verify(&self, entity: &Entity, doc: &Document) -> Vec<VerifyFailure> {
        let mut failures = verify_pbox(entity, doc, self.fields());
        let id = entity.id();
        if let (Ok(profile), Ok(height)) = (doc.get(id, PROFILE_HEIGHT), doc.get(id, Z_LENGTH))
            && profile > height
        {
            failures.push(field_failure(
                entity,
                PROFILE_HEIGHT.name(),
                format!("profile height {profile} exceeds ZLength {height}"),
            ));
        }
        failures
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
