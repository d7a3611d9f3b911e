//! Spot lights.

use crate::tags;
use floorplan_model::{
    Constraint, EntityClass, FieldChange, FieldDefault, FieldKey, FieldSpec,
};
use floorplan_types::{ClassTag, DirtyKind, DirtyKinds};

pub const INTENSITY: FieldKey<f64> = FieldKey::new("Intensity");
pub const TEMPERATURE: FieldKey<f64> = FieldKey::new("Temperature");
pub const ENABLED: FieldKey<bool> = FieldKey::new("Enabled");
pub const NAME: FieldKey<String> = FieldKey::new("Name");

pub const SPOTLIGHT_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("x", FieldDefault::Number(0.0))
        .constrained(Constraint::Number)
        .dirties(DirtyKind::Position),
    FieldSpec::state("y", FieldDefault::Number(0.0))
        .constrained(Constraint::Number)
        .dirties(DirtyKind::Position),
    FieldSpec::state("z", FieldDefault::Number(240.0))
        .constrained(Constraint::Number)
        .dirties(DirtyKind::Position),
    FieldSpec::state("Intensity", FieldDefault::Number(1500.0))
        .constrained(Constraint::NonNegative)
        .dirties(DirtyKind::Preview),
    FieldSpec::state("Temperature", FieldDefault::Number(4000.0))
        .constrained(Constraint::Range {
            min: 1000.0,
            max: 12000.0,
        })
        .dirties(DirtyKind::Preview),
    FieldSpec::state("Enabled", FieldDefault::Bool(true))
        .constrained(Constraint::Bool)
        .dirties(DirtyKind::Display),
    FieldSpec::scalar("Name", FieldDefault::Text("Spot")).constrained(Constraint::Text),
];

/// A point light with a cone. Lights are not content and carry their own
/// position fields.
pub struct SpotLightClass {
    tag: ClassTag,
}

impl SpotLightClass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static(tags::SPOTLIGHT),
        }
    }
}

impl Default for SpotLightClass {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityClass for SpotLightClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        SPOTLIGHT_FIELDS
    }

    /// An intensity change only needs a preview re-render, unless it switches
    /// the light on or off, which also dirties the display.
    fn on_field_changed(&self, change: &FieldChange<'_>) -> DirtyKinds {
        let declared = self
            .field(change.field)
            .and_then(|spec| spec.dirties)
            .map_or(DirtyKinds::empty(), DirtyKinds::from);
        if change.field == INTENSITY.name() {
            let lit = |v: &serde_json::Value| v.as_f64().is_some_and(|n| n > 0.0);
            if lit(change.old) != lit(change.new) {
                return declared | DirtyKinds::DISPLAY;
            }
        }
        declared
    }
}
