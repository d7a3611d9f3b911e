//! Sessions: grouping boundaries with their own undo/redo stacks.

use crate::request::TrackedRequest;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Identifier of a session within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const DEFAULT: Self = Self(0);

    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Options for [`TransactionManager::start_session`](crate::TransactionManager::start_session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Whether the session's requests end up on the undo stack.
    pub undo_redo: bool,
    /// Description of the merged undo unit. Defaults to the member
    /// descriptions joined.
    pub description: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            undo_redo: true,
            description: None,
        }
    }
}

/// Options for [`TransactionManager::commit_session`](crate::TransactionManager::commit_session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitOptions {
    /// Fold the session into a single undo unit in the parent session.
    pub merge: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self { merge: true }
    }
}

/// One open session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    options: SessionOptions,
    undo_stack: VecDeque<TrackedRequest>,
    redo_stack: Vec<TrackedRequest>,
}

impl Session {
    pub(crate) fn new(id: SessionId, options: SessionOptions) -> Self {
        Self {
            id,
            options,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo descriptions, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self) -> Vec<String> {
        self.undo_stack
            .iter()
            .rev()
            .map(TrackedRequest::description)
            .collect()
    }

    /// Redo descriptions, next first.
    #[must_use]
    pub fn redo_descriptions(&self) -> Vec<String> {
        self.redo_stack
            .iter()
            .rev()
            .map(TrackedRequest::description)
            .collect()
    }

    /// Records a committed unit. Clears the redo stack and, when capped,
    /// evicts the oldest units. Returns how many were evicted.
    pub(crate) fn record(&mut self, unit: TrackedRequest, cap: Option<usize>) -> usize {
        self.redo_stack.clear();
        self.undo_stack.push_back(unit);
        let mut evicted = 0;
        if let Some(cap) = cap {
            while self.undo_stack.len() > cap {
                self.undo_stack.pop_front();
                evicted += 1;
            }
        }
        evicted
    }

    pub(crate) fn pop_undo(&mut self) -> Option<TrackedRequest> {
        self.undo_stack.pop_back()
    }

    pub(crate) fn push_undo(&mut self, unit: TrackedRequest) {
        self.undo_stack.push_back(unit);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<TrackedRequest> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_redo(&mut self, unit: TrackedRequest) {
        self.redo_stack.push(unit);
    }

    pub(crate) fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Takes every committed unit, oldest first, discarding the redo stack.
    pub(crate) fn into_units(self) -> Vec<TrackedRequest> {
        self.undo_stack.into_iter().collect()
    }
}
