//! Requests, sessions and undo/redo for the floorplan document.
//!
//! Every user-visible mutation is a [`Request`]. The [`TransactionManager`]
//! commits requests against a [`Document`](floorplan_model::Document),
//! groups them into sessions and keeps per-session undo/redo stacks.
//! Each commit, undo and redo runs inside a dirty batch, so an affected
//! entity's dirty generation moves by exactly one per operation.

mod error;
mod factory;
mod manager;
mod request;
pub mod requests;
mod session;

pub use error::{TxnError, TxnResult};
pub use factory::{RequestConstructor, RequestFactory};
pub use manager::{TransactionConfig, TransactionManager};
pub use request::{Request, RequestState, TrackedRequest};
pub use requests::{
    CompositeRequest, CreateEntityRequest, PurgeRemovedRequest, RemoveEntityRequest,
    SetFieldRequest, SetFlagRequest, ShareFieldRequest, SnapshotRequest,
};
pub use session::{CommitOptions, Session, SessionId, SessionOptions};
