//! Layers: one storey of the plan. Content sits on a layer as its child.

use crate::content::{Z_LENGTH, field_failure};
use crate::tags;
use floorplan_model::{
    Constraint, Document, Entity, EntityClass, FieldDefault, FieldKey, FieldSpec, VerifyFailure,
    verify_fields,
};
use floorplan_types::{ClassTag, DirtyKind};

pub const HEIGHT: FieldKey<f64> = FieldKey::new("Height");
pub const SLAB_THICKNESS: FieldKey<f64> = FieldKey::new("SlabThickness");
pub const ELEVATION: FieldKey<f64> = FieldKey::new("Elevation");
pub const NAME: FieldKey<String> = FieldKey::new("Name");
pub const INDEX: FieldKey<f64> = FieldKey::new("Index");

pub const LAYER_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("Height", FieldDefault::Number(280.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("SlabThickness", FieldDefault::Number(12.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("Elevation", FieldDefault::Number(0.0))
        .constrained(Constraint::Number)
        .dirties(DirtyKind::Position),
    FieldSpec::scalar("Name", FieldDefault::Text("Layer")).constrained(Constraint::Text),
    FieldSpec::scalar("Index", FieldDefault::Number(0.0)).constrained(Constraint::NonNegative),
];

pub struct LayerClass {
    tag: ClassTag,
}

impl LayerClass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static(tags::LAYER),
        }
    }
}

impl Default for LayerClass {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityClass for LayerClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        LAYER_FIELDS
    }

    /// Field checks, plus: the slab must be thinner than the storey, and no
    /// live content on the layer may be taller than it.
    fn verify(&self, entity: &Entity, doc: &Document) -> Vec<VerifyFailure> {
        let mut failures = verify_fields(entity, doc, LAYER_FIELDS);
        let id = entity.id();
        let Ok(height) = doc.get(id, HEIGHT) else {
            return failures;
        };
        if let Ok(slab) = doc.get(id, SLAB_THICKNESS)
            && slab >= height
        {
            failures.push(field_failure(
                entity,
                SLAB_THICKNESS.name(),
                format!("slab thickness {slab} must be less than height {height}"),
            ));
        }
        for child in doc.children(id) {
            let live = doc.entity(child).is_some_and(|e| !e.is_removed());
            if let Ok(z) = doc.get(child, Z_LENGTH)
                && live
                && z > height
            {
                failures.push(VerifyFailure {
                    entity: id,
                    class_tag: entity.class_tag().clone(),
                    field: None,
                    reason: format!("content {child} is {z} tall, layer is {height}"),
                });
            }
        }
        failures
    }
}
