use super::types;
use crate::error::{TxnError, TxnResult};
use crate::request::Request;
use floorplan_model::Document;
use floorplan_types::{EntityId, RequestType};
use tracing::info;

/// Drops every removed entity for good. Not undoable.
#[derive(Default)]
pub struct PurgeRemovedRequest {
    purged: Vec<EntityId>,
}

impl PurgeRemovedRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn purged(&self) -> &[EntityId] {
        &self.purged
    }
}

impl Request for PurgeRemovedRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::PURGE_REMOVED)
    }

    fn description(&self) -> String {
        "Purge removed entities".to_string()
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        let removed: Vec<EntityId> = doc
            .entities()
            .filter(|e| e.is_removed())
            .map(|e| e.id())
            .collect();
        for id in &removed {
            doc.purge(*id)?;
        }
        info!(count = removed.len(), "Purged removed entities");
        self.purged = removed;
        Ok(())
    }

    fn on_undo(&mut self, _doc: &mut Document) -> TxnResult<()> {
        Err(TxnError::NotUndoable(self.description()))
    }

    fn on_redo(&mut self, _doc: &mut Document) -> TxnResult<()> {
        Err(TxnError::NotUndoable(self.description()))
    }

    fn can_undo_redo(&self) -> bool {
        false
    }
}
