//! Shared test classes for model tests.

#![allow(dead_code)]

use floorplan_model::io::{Dumper, EntityRecord, IoResult, Loader};
use floorplan_model::{
    Constraint, DirtyEvent, DirtyObserver, Document, Entity, EntityClass, EntityRegistry,
    FieldDefault, FieldKey, FieldSpec,
};
use floorplan_types::{ClassTag, DirtyKind};
use std::sync::{Arc, Mutex};

pub const X_LENGTH: FieldKey<f64> = FieldKey::new("XLength");
pub const Y_LENGTH: FieldKey<f64> = FieldKey::new("YLength");
pub const MATERIAL: FieldKey<String> = FieldKey::new("Material");
pub const LABEL: FieldKey<String> = FieldKey::new("Label");
pub const HEIGHT: FieldKey<f64> = FieldKey::new("Height");

pub const BLOCK_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("XLength", FieldDefault::Number(100.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("YLength", FieldDefault::Number(50.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("Material", FieldDefault::Text("oak"))
        .constrained(Constraint::Text)
        .dirties(DirtyKind::Material),
    FieldSpec::scalar("Label", FieldDefault::Text("")).constrained(Constraint::Text),
];

pub const TALL_FIELDS: &[FieldSpec] = &[FieldSpec::state("Height", FieldDefault::Number(240.0))
    .constrained(Constraint::Positive)
    .dirties(DirtyKind::Geometry)];

/// A box-like test class.
pub struct BlockClass {
    tag: ClassTag,
}

impl BlockClass {
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static("Block"),
        }
    }
}

impl EntityClass for BlockClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        BLOCK_FIELDS
    }
}

/// Extends Block with a height, dumping through Block's field table first.
pub struct TallBlockClass {
    tag: ClassTag,
    fields: Vec<FieldSpec>,
}

impl TallBlockClass {
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static("TallBlock"),
            fields: BLOCK_FIELDS.iter().chain(TALL_FIELDS).copied().collect(),
        }
    }
}

impl EntityClass for TallBlockClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn dump(&self, entity: &Entity, dumper: &mut Dumper<'_>) -> EntityRecord {
        let mut record = dumper.base_record(entity);
        dumper.write_fields(&mut record, entity, BLOCK_FIELDS);
        dumper.write_fields(&mut record, entity, TALL_FIELDS);
        record
    }

    fn load(
        &self,
        entity: &mut Entity,
        record: &EntityRecord,
        loader: &mut Loader<'_>,
    ) -> IoResult<()> {
        loader.read_base(entity, record);
        loader.read_fields(entity, record, BLOCK_FIELDS);
        loader.read_fields(entity, record, TALL_FIELDS);
        Ok(())
    }
}

pub const GROUP_FIELDS: &[FieldSpec] =
    &[FieldSpec::scalar("Name", FieldDefault::Text("group")).constrained(Constraint::Text)];

/// A container class with no geometry of its own.
pub struct GroupClass {
    tag: ClassTag,
}

impl GroupClass {
    pub fn new() -> Self {
        Self {
            tag: ClassTag::from_static("Group"),
        }
    }
}

impl EntityClass for GroupClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        GROUP_FIELDS
    }
}

pub fn registry() -> Arc<EntityRegistry> {
    let mut registry = EntityRegistry::new();
    registry.register(BlockClass::new()).unwrap();
    registry.register(TallBlockClass::new()).unwrap();
    registry.register(GroupClass::new()).unwrap();
    Arc::new(registry)
}

pub fn document() -> Document {
    Document::new(registry())
}

/// Collects every dirty event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<DirtyEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<DirtyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DirtyObserver for RecordingObserver {
    fn on_dirty(&self, event: &DirtyEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
