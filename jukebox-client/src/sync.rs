//! Queue synchronizer
//!
//! Holds the local replica of the pending queue. A snapshot only replaces the
//! replica when the id sequence changed; field-level differences (a new
//! thumbnail URL, say) are ignored so the player is not reloaded for them.

use jukebox_common::QueueItem;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Snapshot adopted; the coordinator must re-check the player
    Changed,
    /// Snapshot discarded
    Unchanged,
}

/// Length or pairwise id difference
pub fn is_structural_change(current: &[QueueItem], next: &[QueueItem]) -> bool {
    current.len() != next.len() || current.iter().zip(next).any(|(a, b)| a.id != b.id)
}

#[derive(Debug, Default)]
pub struct QueueSynchronizer {
    queue: Vec<QueueItem>,
}

impl QueueSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> &[QueueItem] {
        &self.queue
    }

    /// Compare a fetched snapshot with the held queue and adopt it if it differs
    pub fn apply_snapshot(&mut self, mut snapshot: Vec<QueueItem>) -> SyncOutcome {
        snapshot.retain(|item| item.pending);

        if !is_structural_change(&self.queue, &snapshot) {
            debug!(len = snapshot.len(), "Queue snapshot unchanged");
            return SyncOutcome::Unchanged;
        }

        debug!(from = self.queue.len(), to = snapshot.len(), "Queue snapshot changed");
        self.queue = snapshot;
        SyncOutcome::Changed
    }
}
