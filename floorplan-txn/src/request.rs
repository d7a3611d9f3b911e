//! The request trait and its lifecycle tracking.

use crate::error::{TxnError, TxnResult};
use floorplan_model::Document;
use floorplan_types::RequestType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Created,
    Committed,
    Undone,
}

/// An atomic, undoable mutation of the document.
///
/// `on_commit` validates fully before mutating, so a failed commit leaves
/// nothing behind, and captures what `on_undo` needs. `on_redo` replays the
/// captured forward effect rather than re-running the commit logic.
///
/// Callbacks get the document, not the manager, so a request cannot commit
/// other requests from inside its own commit.
pub trait Request: Send {
    /// Factory tag of this request kind.
    fn request_type(&self) -> RequestType;

    /// Human-readable description for undo/redo menus.
    fn description(&self) -> String {
        self.request_type().to_string()
    }

    fn on_commit(&mut self, doc: &mut Document) -> TxnResult<()>;

    fn on_undo(&mut self, doc: &mut Document) -> TxnResult<()>;

    fn on_redo(&mut self, doc: &mut Document) -> TxnResult<()>;

    /// Requests returning false are applied but never recorded.
    fn can_undo_redo(&self) -> bool {
        true
    }
}

/// A request together with its lifecycle state.
///
/// Enforces `Created -> Committed <-> Undone`.
pub struct TrackedRequest {
    request: Box<dyn Request>,
    state: RequestState,
}

impl TrackedRequest {
    #[must_use]
    pub fn new(request: Box<dyn Request>) -> Self {
        Self {
            request,
            state: RequestState::Created,
        }
    }

    /// Wraps a request whose effect is already applied.
    pub(crate) fn committed(request: Box<dyn Request>) -> Self {
        Self {
            request,
            state: RequestState::Committed,
        }
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.state
    }

    #[must_use]
    pub fn request_type(&self) -> RequestType {
        self.request.request_type()
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.request.description()
    }

    #[must_use]
    pub fn can_undo_redo(&self) -> bool {
        self.request.can_undo_redo()
    }

    fn expect_state(&self, expected: RequestState) -> TxnResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TxnError::InvalidRequestState {
                expected,
                found: self.state,
            })
        }
    }

    pub fn commit(&mut self, doc: &mut Document) -> TxnResult<()> {
        self.expect_state(RequestState::Created)?;
        self.request.on_commit(doc)?;
        self.state = RequestState::Committed;
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document) -> TxnResult<()> {
        self.expect_state(RequestState::Committed)?;
        self.request.on_undo(doc)?;
        self.state = RequestState::Undone;
        Ok(())
    }

    pub fn redo(&mut self, doc: &mut Document) -> TxnResult<()> {
        self.expect_state(RequestState::Undone)?;
        self.request.on_redo(doc)?;
        self.state = RequestState::Committed;
        Ok(())
    }
}

impl fmt::Debug for TrackedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedRequest")
            .field("type", &self.request.request_type())
            .field("state", &self.state)
            .finish()
    }
}
