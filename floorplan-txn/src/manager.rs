//! The transaction manager.
//!
//! Owns a stack of sessions. The bottom one is the permanent default
//! session; explicit sessions are pushed with
//! [`start_session`](TransactionManager::start_session) and popped by
//! commit, abort or end. Requests always commit into the innermost session.
//!
//! A request that fails inside an explicit session rolls that whole session
//! back: its committed requests are undone in reverse order and the session
//! is popped. In the default session a failure only rejects the request.

use crate::error::{TxnError, TxnResult};
use crate::factory::RequestFactory;
use crate::request::{Request, TrackedRequest};
use crate::requests::CompositeRequest;
use crate::session::{CommitOptions, Session, SessionId, SessionOptions};
use floorplan_model::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Manager configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Undo units kept in the default session; the oldest is evicted first.
    pub max_undo_steps: usize,
    /// When false, requests apply but leave no undo history. Open explicit
    /// sessions still track their requests for rollback.
    pub enabled: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: 25,
            enabled: true,
        }
    }
}

/// Commits requests and drives undo/redo.
pub struct TransactionManager {
    config: TransactionConfig,
    factory: RequestFactory,
    sessions: Vec<Session>,
    next_session: u64,
    blocked: u32,
}

impl TransactionManager {
    #[must_use]
    pub fn new(config: TransactionConfig) -> Self {
        Self {
            config,
            factory: RequestFactory::with_builtins(),
            sessions: vec![Session::new(SessionId::DEFAULT, SessionOptions::default())],
            next_session: 1,
            blocked: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    #[must_use]
    pub fn factory(&self) -> &RequestFactory {
        &self.factory
    }

    /// For registering additional request types.
    pub fn factory_mut(&mut self) -> &mut RequestFactory {
        &mut self.factory
    }

    /// Builds a request through the factory.
    pub fn create_request(&self, request_type: &str, args: &Value) -> TxnResult<Box<dyn Request>> {
        self.factory.create(request_type, args)
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Number of open sessions, the default one included.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn active_session(&self) -> SessionId {
        self.active().id()
    }

    fn active(&self) -> &Session {
        // The default session is never popped.
        &self.sessions[self.sessions.len() - 1]
    }

    fn active_mut(&mut self) -> &mut Session {
        let last = self.sessions.len() - 1;
        &mut self.sessions[last]
    }

    fn cap_for(&self, index: usize) -> Option<usize> {
        (index == 0).then_some(self.config.max_undo_steps)
    }

    /// Opens a session on top of the current one.
    pub fn start_session(&mut self, options: SessionOptions) -> SessionId {
        let id = SessionId::new(self.next_session);
        self.next_session += 1;
        debug!(session = %id, undo_redo = options.undo_redo, "Started session");
        self.sessions.push(Session::new(id, options));
        id
    }

    fn pop_session(&mut self, id: SessionId) -> TxnResult<Session> {
        if self.sessions.len() < 2 || self.active().id() != id {
            return Err(TxnError::SessionNotActive(id));
        }
        self.sessions.pop().ok_or(TxnError::SessionNotActive(id))
    }

    /// Closes a session, keeping its effects.
    ///
    /// With `merge`, its requests become a single undo unit in the parent
    /// session; otherwise each stays its own unit. A session opened with
    /// `undo_redo = false` leaves nothing to undo.
    pub fn commit_session(&mut self, id: SessionId, options: CommitOptions) -> TxnResult<()> {
        let session = self.pop_session(id)?;
        let undo_redo = session.options().undo_redo;
        let description = session.options().description.clone();
        let units = session.into_units();
        let parent_index = self.sessions.len() - 1;
        let cap = self.cap_for(parent_index);
        debug!(session = %id, units = units.len(), merge = options.merge, "Committing session");

        if units.is_empty() {
            return Ok(());
        }
        let parent = &mut self.sessions[parent_index];
        if !undo_redo || !self.config.enabled {
            parent.clear_redo();
            return Ok(());
        }
        if options.merge {
            let description = description.unwrap_or_else(|| {
                units
                    .iter()
                    .map(TrackedRequest::description)
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            let composite = CompositeRequest::from_committed(description, units);
            parent.record(TrackedRequest::committed(Box::new(composite)), cap);
        } else {
            for unit in units {
                parent.record(unit, cap);
            }
        }
        Ok(())
    }

    /// Closes a session, undoing its requests in reverse order.
    pub fn abort_session(&mut self, doc: &mut Document, id: SessionId) -> TxnResult<()> {
        let session = self.pop_session(id)?;
        debug!(session = %id, "Aborting session");
        Self::unwind(doc, session)
    }

    /// Closes a session, keeping its effects without undo entries.
    pub fn end_session(&mut self, id: SessionId) -> TxnResult<()> {
        let session = self.pop_session(id)?;
        let had_units = session.undo_len() > 0;
        debug!(session = %id, "Ended session");
        if had_units {
            self.active_mut().clear_redo();
        }
        Ok(())
    }

    /// Undoes every unit of a popped session, newest first. Keeps going past
    /// failures and returns the first one.
    fn unwind(doc: &mut Document, session: Session) -> TxnResult<()> {
        let mut units = session.into_units();
        let mut first_error = None;
        doc.batched(|doc| {
            while let Some(mut unit) = units.pop() {
                if let Err(e) = unit.undo(doc) {
                    warn!(request = %unit.request_type(), error = %e, "Undo during rollback failed");
                    first_error.get_or_insert(e);
                }
            }
        });
        first_error.map_or(Ok(()), Err)
    }

    // ── Commit ──────────────────────────────────────────────────────

    /// Commits a request into the active session.
    ///
    /// A failed request leaves no mutation behind and is never recorded.
    /// Inside an explicit session the failure also rolls the session back
    /// and is reported as `SessionRolledBack`. Requests that cannot be undone
    /// are refused inside explicit sessions the same way, before they apply.
    pub fn commit(&mut self, doc: &mut Document, request: Box<dyn Request>) -> TxnResult<()> {
        let mut unit = TrackedRequest::new(request);
        let session = self.active_session();
        let result = if session != SessionId::DEFAULT && !unit.can_undo_redo() {
            // A session must stay able to roll back everything it applied.
            Err(TxnError::NotUndoable(unit.description()))
        } else {
            doc.batched(|doc| unit.commit(doc))
        };

        if let Err(e) = result {
            warn!(request = %unit.request_type(), session = %session, error = %e, "Commit failed");
            if session == SessionId::DEFAULT {
                return Err(e);
            }
            let popped = self.pop_session(session)?;
            if let Err(rollback_err) = Self::unwind(doc, popped) {
                warn!(session = %session, error = %rollback_err, "Session rollback incomplete");
            }
            info!(session = %session, "Session rolled back");
            return Err(TxnError::SessionRolledBack {
                session,
                source: Box::new(e),
            });
        }

        debug!(request = %unit.request_type(), session = %session, "Committed request");
        let index = self.sessions.len() - 1;
        if index == 0 {
            if !unit.can_undo_redo() {
                // Recorded units may refer to state this request destroyed.
                self.clear();
                return Ok(());
            }
            if !self.config.enabled {
                self.active_mut().clear_redo();
                return Ok(());
            }
        }
        // Explicit sessions always keep their units so a rollback can undo
        // them. `enabled` decides what reaches the parent on commit.
        let cap = self.cap_for(index);
        let evicted = self.sessions[index].record(unit, cap);
        if evicted > 0 {
            debug!(evicted, "Evicted oldest undo units");
        }
        Ok(())
    }

    /// Builds a request through the factory and commits it.
    pub fn commit_new(&mut self, doc: &mut Document, request_type: &str, args: &Value) -> TxnResult<()> {
        let request = self.create_request(request_type, args)?;
        self.commit(doc, request)
    }

    // ── Undo / redo ─────────────────────────────────────────────────

    /// Index of the innermost session whose requests are undoable.
    fn undo_session_index(&self) -> usize {
        self.sessions
            .iter()
            .rposition(|s| s.options().undo_redo)
            .unwrap_or(0)
    }

    /// Aborts every session above `index`, innermost first.
    fn abort_above(&mut self, doc: &mut Document, index: usize) -> TxnResult<()> {
        while self.sessions.len() - 1 > index {
            let id = self.active_session();
            self.abort_session(doc, id)?;
        }
        Ok(())
    }

    /// Undoes the most recent unit. Returns false if there was nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> TxnResult<bool> {
        if self.is_undo_redo_blocked() {
            return Err(TxnError::UndoRedoBlocked);
        }
        let index = self.undo_session_index();
        self.abort_above(doc, index)?;
        let session = &mut self.sessions[index];
        let Some(mut unit) = session.pop_undo() else {
            return Ok(false);
        };
        match doc.batched(|doc| unit.undo(doc)) {
            Ok(()) => {
                debug!(request = %unit.request_type(), "Undone");
                session.push_redo(unit);
                Ok(true)
            }
            Err(e) => {
                warn!(request = %unit.request_type(), error = %e, "Undo failed");
                session.push_undo(unit);
                Err(e)
            }
        }
    }

    /// Redoes the most recently undone unit. Returns false if there was
    /// nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> TxnResult<bool> {
        if self.is_undo_redo_blocked() {
            return Err(TxnError::UndoRedoBlocked);
        }
        let index = self.undo_session_index();
        self.abort_above(doc, index)?;
        let session = &mut self.sessions[index];
        let Some(mut unit) = session.pop_redo() else {
            return Ok(false);
        };
        match doc.batched(|doc| unit.redo(doc)) {
            Ok(()) => {
                debug!(request = %unit.request_type(), "Redone");
                session.push_undo(unit);
                Ok(true)
            }
            Err(e) => {
                warn!(request = %unit.request_type(), error = %e, "Redo failed");
                session.push_redo(unit);
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.is_undo_redo_blocked() && self.sessions[self.undo_session_index()].undo_len() > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.is_undo_redo_blocked() && self.sessions[self.undo_session_index()].redo_len() > 0
    }

    /// Undo descriptions of the innermost undoable session, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self) -> Vec<String> {
        self.sessions[self.undo_session_index()].undo_descriptions()
    }

    /// Redo descriptions of the innermost undoable session, next first.
    #[must_use]
    pub fn redo_descriptions(&self) -> Vec<String> {
        self.sessions[self.undo_session_index()].redo_descriptions()
    }

    // ── Switches ────────────────────────────────────────────────────

    /// Blocks undo/redo. Blocks nest.
    pub fn block_undo_redo(&mut self) {
        self.blocked += 1;
    }

    pub fn unblock_undo_redo(&mut self) {
        self.blocked = self.blocked.saturating_sub(1);
    }

    #[must_use]
    pub fn is_undo_redo_blocked(&self) -> bool {
        self.blocked > 0
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Requests keep applying but are no longer recorded.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Drops every undo and redo unit of every open session.
    pub fn clear(&mut self) {
        for session in &mut self.sessions {
            session.clear();
        }
        debug!("Cleared undo history");
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(TransactionConfig::default())
    }
}
