use super::{live, parse_args, types};
use crate::error::{TxnError, TxnResult};
use crate::request::Request;
use floorplan_model::Document;
use floorplan_types::{EntityFlags, EntityId, RequestType};
use serde::Deserialize;
use serde_json::Value;

/// Turns entity flags on or off. Removal goes through
/// [`RemoveEntityRequest`](super::RemoveEntityRequest) instead.
pub struct SetFlagRequest {
    entity: EntityId,
    flags: EntityFlags,
    on: bool,
    before: Option<EntityFlags>,
    after: Option<EntityFlags>,
}

#[derive(Deserialize)]
struct Args {
    entity: EntityId,
    flags: EntityFlags,
    on: bool,
}

impl SetFlagRequest {
    #[must_use]
    pub fn new(entity: EntityId, flags: EntityFlags, on: bool) -> Self {
        Self {
            entity,
            flags,
            on,
            before: None,
            after: None,
        }
    }

    /// Builds the request from `{"entity", "flags": <bits>, "on"}`.
    pub fn from_args(args: &Value) -> TxnResult<Self> {
        let args: Args = parse_args(types::SET_FLAG, args)?;
        Ok(Self::new(args.entity, args.flags, args.on))
    }
}

impl Request for SetFlagRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::SET_FLAG)
    }

    fn description(&self) -> String {
        let verb = if self.on { "Set" } else { "Clear" };
        format!("{verb} flags {:#x}", self.flags.bits())
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        if self.flags.contains(EntityFlags::REMOVED) {
            return Err(TxnError::PreconditionFailed {
                entity: self.entity,
                reason: "the removed flag is managed by remove/create requests".to_string(),
            });
        }
        let before = live(doc, self.entity)?.flags();
        let mut after = before;
        after.set(self.flags, self.on);
        doc.set_flags(self.entity, after)?;
        self.before = Some(before);
        self.after = Some(after);
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(before) = self.before {
            doc.set_flags(self.entity, before)?;
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(after) = self.after {
            doc.set_flags(self.entity, after)?;
        }
        Ok(())
    }
}
