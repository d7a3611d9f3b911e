use super::{existing, types};
use crate::error::{TxnError, TxnResult};
use crate::request::{Request, RequestState};
use floorplan_model::Document;
use floorplan_model::io::{Snapshot, capture_snapshot, restore_snapshot};
use floorplan_types::{EntityId, RequestType};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Arbitrary document mutation wrapped by a [`SnapshotRequest`].
pub type Mutation = Box<dyn FnOnce(&mut Document) -> TxnResult<()> + Send>;

/// Generic state request: runs a mutation and restores dumps of the
/// target entities to undo and redo it.
///
/// Entities the mutation creates are tracked too: undo marks them removed,
/// redo brings them back. Targets the mutation purges are reloaded on undo
/// and purged again on redo. Changes to entities that are neither targets nor
/// created by the mutation are not captured.
pub struct SnapshotRequest {
    description: String,
    targets: Vec<EntityId>,
    mutation: Option<Mutation>,
    before: Option<Snapshot>,
    after: Option<Snapshot>,
    created: Vec<EntityId>,
    purged: Vec<EntityId>,
}

impl SnapshotRequest {
    pub fn new(
        description: impl Into<String>,
        targets: Vec<EntityId>,
        mutation: impl FnOnce(&mut Document) -> TxnResult<()> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            targets,
            mutation: Some(Box::new(mutation)),
            before: None,
            after: None,
            created: Vec::new(),
            purged: Vec::new(),
        }
    }

    /// Entities the mutation created, once committed.
    #[must_use]
    pub fn created(&self) -> &[EntityId] {
        &self.created
    }

    /// Targets the mutation purged, once committed.
    #[must_use]
    pub fn purged(&self) -> &[EntityId] {
        &self.purged
    }
}

impl Request for SnapshotRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::SNAPSHOT)
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        for id in &self.targets {
            existing(doc, *id)?;
        }
        let Some(mutation) = self.mutation.take() else {
            return Err(TxnError::InvalidRequestState {
                expected: RequestState::Created,
                found: RequestState::Committed,
            });
        };
        let before = capture_snapshot(doc, &self.targets)?;
        let known: HashSet<EntityId> = doc.entity_ids().into_iter().collect();

        let outcome = mutation(doc);
        let created: Vec<EntityId> = doc
            .entity_ids()
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        let purged: Vec<EntityId> = self
            .targets
            .iter()
            .copied()
            .filter(|id| !doc.contains(*id))
            .collect();

        let captured = outcome.and_then(|()| {
            let tracked: Vec<EntityId> = self
                .targets
                .iter()
                .chain(&created)
                .copied()
                .filter(|id| doc.contains(*id))
                .collect();
            capture_snapshot(doc, &tracked).map_err(TxnError::from)
        });
        let after = match captured {
            Ok(after) => after,
            Err(e) => {
                for id in &created {
                    if doc.contains(*id) {
                        doc.purge(*id)?;
                    }
                }
                restore_snapshot(doc, &before)?;
                warn!(description = %self.description, error = %e, "Snapshot mutation failed, restored");
                return Err(e);
            }
        };

        debug!(
            description = %self.description,
            targets = self.targets.len(),
            created = created.len(),
            purged = purged.len(),
            "Captured snapshot request"
        );
        self.before = Some(before);
        self.after = Some(after);
        self.created = created;
        self.purged = purged;
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(before) = &self.before {
            restore_snapshot(doc, before)?;
        }
        for id in &self.created {
            doc.mark_removed(*id)?;
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        if let Some(after) = &self.after {
            restore_snapshot(doc, after)?;
        }
        for id in &self.purged {
            if doc.contains(*id) {
                doc.purge(*id)?;
            }
        }
        Ok(())
    }
}
