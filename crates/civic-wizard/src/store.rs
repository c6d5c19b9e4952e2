//! DraftStore: single-writer holder of the session's draft
//!
//! Readers get immutable snapshots. Merges need `&mut self`, so two merges
//! can never interleave and they apply in the order they are issued.
use chrono::{DateTime, Utc};
use civic_core::{DraftPatch, DraftRecord};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
pub struct DraftStore {
    current: Arc<DraftRecord>,
    revision: u64,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Later merges never change a snapshot already
    /// handed out.
    pub fn read(&self) -> Arc<DraftRecord> {
        Arc::clone(&self.current)
    }

    /// Number of merges applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply a partial update and return the new snapshot. Empty patches
    /// leave the revision untouched.
    pub fn merge(&mut self, patch: DraftPatch) -> Arc<DraftRecord> {
        if patch.is_empty() {
            return self.read();
        }
        trace!(revision = self.revision + 1, fields = ?patch.touched(), "merging draft patch");
        Arc::make_mut(&mut self.current).apply(patch);
        self.revision += 1;
        self.read()
    }

    /// Stamp the finalize instant onto the draft
    pub(crate) fn freeze(&mut self, at: DateTime<Utc>) -> Arc<DraftRecord> {
        let draft = Arc::make_mut(&mut self.current);
        draft.created_at = Some(at);
        draft.updated_at = Some(at);
        self.revision += 1;
        self.read()
    }

    /// Drop the draft and start over empty
    pub fn reset(&mut self) {
        self.current = Arc::new(DraftRecord::new());
        self.revision = 0;
    }
}
