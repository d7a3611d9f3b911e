//! Error types for transactions.

use crate::request::RequestState;
use crate::session::SessionId;
use floorplan_model::ModelError;
use floorplan_model::io::IoError;
use floorplan_types::{EntityId, RequestType};
use thiserror::Error;

/// Result type for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors that can occur while committing, undoing or redoing requests.
#[derive(Debug, Error)]
pub enum TxnError {
    /// The request targets an entity or field that does not exist.
    #[error("invalid target {entity}: {reason}")]
    InvalidTarget { entity: EntityId, reason: String },

    /// The target exists but is not in a state the request accepts.
    #[error("precondition failed for {entity}: {reason}")]
    PreconditionFailed { entity: EntityId, reason: String },

    /// Error from the model layer.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Error from dump/load.
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("request type already registered: {0}")]
    DuplicateRequestType(RequestType),

    /// Request arguments did not parse.
    #[error("invalid arguments for {request_type}: {reason}")]
    InvalidArgs {
        request_type: String,
        reason: String,
    },

    /// The session is not the innermost open session.
    #[error("session {0} is not the active session")]
    SessionNotActive(SessionId),

    /// A request failed inside an explicit session, which was rolled back.
    #[error("session {session} rolled back: {source}")]
    SessionRolledBack {
        session: SessionId,
        source: Box<TxnError>,
    },

    /// A request was driven out of order (e.g. undone before committing).
    #[error("request is {found:?}, expected {expected:?}")]
    InvalidRequestState {
        expected: RequestState,
        found: RequestState,
    },

    #[error("undo/redo is blocked")]
    UndoRedoBlocked,

    #[error("{0} cannot be undone or redone")]
    NotUndoable(String),
}
