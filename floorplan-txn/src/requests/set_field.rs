use super::{editable, field_error, parse_args, types};
use crate::error::TxnResult;
use crate::request::Request;
use floorplan_model::Document;
use floorplan_types::{EntityId, RequestType};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Sets one field of one entity.
pub struct SetFieldRequest {
    entity: EntityId,
    field: String,
    value: Value,
    before: Option<Value>,
    after: Option<Value>,
}

#[derive(Deserialize)]
struct Args {
    entity: EntityId,
    field: String,
    value: Value,
}

impl SetFieldRequest {
    #[must_use]
    pub fn new(entity: EntityId, field: impl Into<String>, value: Value) -> Self {
        Self {
            entity,
            field: field.into(),
            value,
            before: None,
            after: None,
        }
    }

    /// Builds the request from `{"entity", "field", "value"}`.
    pub fn from_args(args: &Value) -> TxnResult<Self> {
        let args: Args = parse_args(types::SET_FIELD, args)?;
        Ok(Self::new(args.entity, args.field, args.value))
    }

    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value before the commit, once committed.
    #[must_use]
    pub fn before(&self) -> Option<&Value> {
        self.before.as_ref()
    }
}

impl Request for SetFieldRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::SET_FIELD)
    }

    fn description(&self) -> String {
        format!("Set {}", self.field)
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        editable(doc, self.entity)?;
        doc.validate_value(self.entity, &self.field, &self.value)
            .map_err(|e| field_error(self.entity, e))?;
        let before = doc
            .value(self.entity, &self.field)
            .map_err(|e| field_error(self.entity, e))?
            .clone();

        doc.set_field(self.entity, &self.field, self.value.clone())
            .map_err(|e| field_error(self.entity, e))?;
        let after = doc.value(self.entity, &self.field)?.clone();
        debug!(entity = %self.entity, field = %self.field, "Set field");
        self.before = Some(before);
        self.after = Some(after);
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(before) = &self.before {
            doc.restore_field(self.entity, &self.field, before.clone())?;
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(after) = &self.after {
            doc.restore_field(self.entity, &self.field, after.clone())?;
        }
        Ok(())
    }
}
