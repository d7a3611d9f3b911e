//! Shared fixtures for transaction tests.

#![allow(dead_code)]

use floorplan_model::{
    Constraint, Document, EntityClass, EntityRegistry, FieldDefault, FieldKey, FieldSpec,
};
use floorplan_txn::{Request, SetFieldRequest, TxnError, TxnResult};
use floorplan_types::{ClassTag, DirtyKind, EntityId, RequestType};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const X_LENGTH: FieldKey<f64> = FieldKey::new("XLength");
pub const Y_LENGTH: FieldKey<f64> = FieldKey::new("YLength");
pub const MATERIAL: FieldKey<String> = FieldKey::new("Material");
pub const LABEL: FieldKey<String> = FieldKey::new("Label");

pub const BOX_FIELDS: &[FieldSpec] = &[
    FieldSpec::state("XLength", FieldDefault::Number(100.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("YLength", FieldDefault::Number(60.0))
        .constrained(Constraint::Positive)
        .dirties(DirtyKind::Geometry),
    FieldSpec::state("Material", FieldDefault::Text("oak"))
        .constrained(Constraint::Text)
        .dirties(DirtyKind::Material),
    FieldSpec::scalar("Label", FieldDefault::Text("")).constrained(Constraint::Text),
];

pub const GROUP_FIELDS: &[FieldSpec] =
    &[FieldSpec::scalar("Name", FieldDefault::Text("group")).constrained(Constraint::Text)];

pub struct BoxClass {
    tag: ClassTag,
}

impl EntityClass for BoxClass {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        BOX_FIELDS
    }
}

pub struct GroupClass {
    tag: ClassTag,
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
    registry
        .register(BoxClass {
            tag: ClassTag::from_static("Box"),
        })
        .unwrap();
    registry
        .register(GroupClass {
            tag: ClassTag::from_static("Group"),
        })
        .unwrap();
    Arc::new(registry)
}

pub fn document() -> Document {
    Document::new(registry())
}

/// A document holding one `Box` with every field at its default.
pub fn document_with_box() -> (Document, EntityId) {
    let mut doc = document();
    let id = doc.create_entity("Box").unwrap();
    (doc, id)
}

pub fn set_length(entity: EntityId, value: f64) -> Box<dyn Request> {
    Box::new(SetFieldRequest::new(entity, "XLength", json!(value)))
}

pub fn x_length(doc: &Document, id: EntityId) -> f64 {
    doc.get(id, X_LENGTH).unwrap()
}

/// Request whose commit always fails after touching nothing.
pub struct FailingRequest;

impl Request for FailingRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static("Failing")
    }

    fn on_commit(&mut self, _doc: &mut Document) -> TxnResult<()> {
        Err(TxnError::InvalidArgs {
            request_type: "Failing".to_string(),
            reason: "always fails".to_string(),
        })
    }

    fn on_undo(&mut self, _doc: &mut Document) -> TxnResult<()> {
        Ok(())
    }

    fn on_redo(&mut self, _doc: &mut Document) -> TxnResult<()> {
        Ok(())
    }
}

/// Request that commits but fails to undo until allowed to.
pub struct StubbornRequest {
    pub entity: EntityId,
    pub undo_allowed: Arc<AtomicBool>,
}

impl Request for StubbornRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static("Stubborn")
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        doc.set_field(self.entity, "Label", json!("stubborn"))?;
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if !self.undo_allowed.load(Ordering::SeqCst) {
            return Err(TxnError::PreconditionFailed {
                entity: self.entity,
                reason: "not yet".to_string(),
            });
        }
        doc.restore_field(self.entity, "Label", json!(""))?;
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        doc.restore_field(self.entity, "Label", json!("stubborn"))?;
        Ok(())
    }
}

pub fn values(v: Value) -> serde_json::Map<String, Value> {
    match v {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}
