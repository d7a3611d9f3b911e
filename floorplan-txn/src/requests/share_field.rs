use super::{editable, field_error, live, parse_args, types};
use crate::error::{TxnError, TxnResult};
use crate::request::Request;
use floorplan_model::{Document, StateField};
use floorplan_types::{EntityId, RequestType, StateId};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Binds a target entity's field to the StateField behind a source
/// entity's field, so the two change together from then on.
pub struct ShareFieldRequest {
    source: EntityId,
    source_field: String,
    target: EntityId,
    target_field: String,
    shared: Option<StateId>,
    original: Option<StateId>,
    released: Option<StateField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Args {
    source: EntityId,
    source_field: String,
    target: EntityId,
    #[serde(default)]
    target_field: Option<String>,
}

impl ShareFieldRequest {
    /// Shares `source.source_field` into `target.target_field`.
    #[must_use]
    pub fn new(
        source: EntityId,
        source_field: impl Into<String>,
        target: EntityId,
        target_field: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_field: source_field.into(),
            target,
            target_field: target_field.into(),
            shared: None,
            original: None,
            released: None,
        }
    }

    /// Builds the request from `{"source", "sourceField", "target", "targetField"?}`.
    /// The target field defaults to the source field.
    pub fn from_args(args: &Value) -> TxnResult<Self> {
        let args: Args = parse_args(types::SHARE_FIELD, args)?;
        let target_field = args
            .target_field
            .unwrap_or_else(|| args.source_field.clone());
        Ok(Self::new(args.source, args.source_field, args.target, target_field))
    }
}

impl Request for ShareFieldRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::SHARE_FIELD)
    }

    fn description(&self) -> String {
        format!("Share {}", self.source_field)
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        live(doc, self.source)?;
        editable(doc, self.target)?;
        if self.source == self.target && self.source_field == self.target_field {
            return Err(TxnError::PreconditionFailed {
                entity: self.target,
                reason: "a field cannot be shared with itself".to_string(),
            });
        }
        let shared = doc
            .state_of(self.source, &self.source_field)
            .map_err(|e| field_error(self.source, e))?;
        let original = doc
            .state_of(self.target, &self.target_field)
            .map_err(|e| field_error(self.target, e))?;
        let shared_value = doc.value(self.source, &self.source_field)?.clone();
        doc.validate_value(self.target, &self.target_field, &shared_value)
            .map_err(|e| field_error(self.target, e))?;

        self.released = doc.bind_field(self.target, &self.target_field, shared)?;
        debug!(
            source = %self.source,
            target = %self.target,
            field = %self.target_field,
            state = %shared,
            "Shared field"
        );
        self.shared = Some(shared);
        self.original = Some(original);
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        let Some(original) = self.original else {
            return Ok(());
        };
        if let Some(state) = self.released.take() {
            if !doc.states().contains(original) {
                doc.adopt_state(state)?;
            }
        }
        doc.bind_field(self.target, &self.target_field, original)?;
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(shared) = self.shared {
            self.released = doc.bind_field(self.target, &self.target_field, shared)?;
        }
        Ok(())
    }
}
