use super::types;
use crate::error::TxnResult;
use crate::request::{Request, RequestState, TrackedRequest};
use floorplan_model::Document;
use floorplan_types::RequestType;
use tracing::warn;

/// Several requests committed, undone and redone as one.
///
/// Commit applies members in order; if one fails, the members already
/// applied are undone in reverse order and the error is returned. Undo runs
/// in reverse order, redo in forward order; members already in the target
/// state are skipped, so a partially failed undo or redo can be retried.
pub struct CompositeRequest {
    description: String,
    members: Vec<TrackedRequest>,
}

impl CompositeRequest {
    #[must_use]
    pub fn new(description: impl Into<String>, requests: Vec<Box<dyn Request>>) -> Self {
        Self {
            description: description.into(),
            members: requests.into_iter().map(TrackedRequest::new).collect(),
        }
    }

    /// Groups members that are already committed, e.g. a finished session.
    pub(crate) fn from_committed(description: String, members: Vec<TrackedRequest>) -> Self {
        Self {
            description,
            members,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member descriptions in commit order.
    #[must_use]
    pub fn member_descriptions(&self) -> Vec<String> {
        self.members.iter().map(TrackedRequest::description).collect()
    }
}

impl Request for CompositeRequest {
    fn request_type(&self) -> RequestType {
        RequestType::from_static(types::COMPOSITE)
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        for index in 0..self.members.len() {
            if let Err(e) = self.members[index].commit(doc) {
                for applied in self.members[..index].iter_mut().rev() {
                    if let Err(undo_err) = applied.undo(doc) {
                        warn!(request = %applied.request_type(), error = %undo_err, "Rollback of composite member failed");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        for member in self.members.iter_mut().rev() {
            if member.state() == RequestState::Committed {
                member.undo(doc)?;
            }
        }
        Ok(())
    }

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        for member in &mut self.members {
            if member.state() == RequestState::Undone {
                member.redo(doc)?;
            }
        }
        Ok(())
    }

    fn can_undo_redo(&self) -> bool {
        self.members.iter().all(TrackedRequest::can_undo_redo)
    }
}
