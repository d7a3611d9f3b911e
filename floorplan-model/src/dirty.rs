//! Dirty tracking.
//!
//! Every entity carries a monotonically increasing generation counter. Each
//! dirty mark bumps it once; inside a batch (see
//! [`Document::begin_dirty_batch`](crate::Document::begin_dirty_batch)) marks
//! are coalesced per entity so one commit, undo or redo bumps it once.

use crate::document::Document;
use floorplan_types::{DirtyKinds, EntityId};
use serde::{Deserialize, Serialize};

/// Per-entity dirty bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirtyState {
    generation: u64,
    pending: DirtyKinds,
}

impl DirtyState {
    /// State of a freshly created entity: generation 0, everything pending.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            generation: 0,
            pending: DirtyKinds::all(),
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn pending(&self) -> DirtyKinds {
        self.pending
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn mark(&mut self, kinds: DirtyKinds) -> u64 {
        self.pending |= kinds;
        self.generation += 1;
        self.generation
    }

    pub(crate) fn take(&mut self) -> DirtyKinds {
        std::mem::take(&mut self.pending)
    }
}

/// Emitted once per entity per dirty flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEvent {
    pub entity: EntityId,
    pub kinds: DirtyKinds,
    pub generation: u64,
}

/// Receives dirty events, e.g. to schedule a redraw.
pub trait DirtyObserver: Send + Sync {
    fn on_dirty(&self, event: &DirtyEvent);
}

/// Records an entity's generation so cached derived data can be checked for
/// staleness later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationToken {
    pub entity: EntityId,
    pub generation: u64,
}

impl GenerationToken {
    /// Returns true if the entity has not been dirtied since the token was taken.
    #[must_use]
    pub fn is_current(&self, doc: &Document) -> bool {
        doc.dirty_generation(self.entity) == Some(self.generation)
    }
}
