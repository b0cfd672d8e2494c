//! Pending-edit tracking for the correctable coil-rows attribute.
//!
//! Edits live in a working set keyed by normalized tag, separate from
//! the committed baseline, until a commit hands them to the external
//! persistence collaborator as one atomic batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::ComparisonResult;
use crate::normalize::normalize_tag;

/// Selectable hot-water coil row counts.
pub const HW_ROWS_MIN: i64 = 1;
pub const HW_ROWS_MAX: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    pub identifier: String,
    pub hw_rows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFailure {
    pub identifier: String,
    pub reason: String,
}

/// What the persistence collaborator reports back from one write batch.
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    /// Identifiers written successfully.
    pub committed: Vec<String>,
    pub failures: Vec<CommitFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    pub committed_count: usize,
    pub failures: Vec<CommitFailure>,
    pub backup_file: String,
}

/// External persistence collaborator.
///
/// `backup` runs before `persist` on every commit; the tracker refuses
/// to touch its state when either step reports failure, so the prior
/// committed state is never discarded without a confirmed backup.
pub trait EditSink {
    /// Snapshot the current committed state. Returns a label for the
    /// backup (typically a file path).
    fn backup(&mut self) -> Result<String, String>;

    /// Write the batch. Per-identifier outcome is mandatory: an edit is
    /// either in `committed` or in `failures`.
    fn persist(&mut self, edits: &[PendingEdit]) -> Result<PersistOutcome, String>;
}

/// Working set of unsaved coil-row edits for one reconciliation session.
/// Not designed for concurrent writers; callers serialize access.
#[derive(Debug, Clone, Default)]
pub struct EditBatch {
    /// Committed baseline by normalized tag.
    committed: BTreeMap<String, i64>,
    /// Pending edits by normalized tag, keeping the caller's raw identifier.
    pending: BTreeMap<String, PendingEdit>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the committed baseline from a fresh comparison run.
    /// Pending edits that now equal the baseline are dropped; the rest
    /// of the user's unsaved work is preserved.
    pub fn seed_baseline(&mut self, results: &[ComparisonResult]) {
        self.committed = results
            .iter()
            .filter_map(|r| r.hw_rows.map(|v| (r.normalized_tag.clone(), v)))
            .collect();
        self.pending
            .retain(|key, edit| self.committed.get(key) != Some(&edit.hw_rows));
    }

    pub fn set_baseline(&mut self, identifier: &str, hw_rows: i64) {
        self.committed.insert(normalize_tag(identifier), hw_rows);
    }

    pub fn committed_value(&self, identifier: &str) -> Option<i64> {
        self.committed.get(&normalize_tag(identifier)).copied()
    }

    /// Record or update a pending edit. Staging a value equal to the
    /// committed baseline is equivalent to unstaging.
    pub fn stage(&mut self, identifier: &str, hw_rows: i64) -> Result<(), EngineError> {
        if !(HW_ROWS_MIN..=HW_ROWS_MAX).contains(&hw_rows) {
            return Err(EngineError::InvalidHwRows {
                identifier: identifier.to_string(),
                value: hw_rows,
            });
        }
        let key = normalize_tag(identifier);
        if self.committed.get(&key) == Some(&hw_rows) {
            self.pending.remove(&key);
        } else {
            self.pending.insert(
                key,
                PendingEdit {
                    identifier: identifier.to_string(),
                    hw_rows,
                },
            );
        }
        Ok(())
    }

    pub fn unstage(&mut self, identifier: &str) {
        self.pending.remove(&normalize_tag(identifier));
    }

    /// Pending edits in deterministic (normalized tag) order.
    pub fn pending_edits(&self) -> Vec<PendingEdit> {
        self.pending.values().cloned().collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Commit the full pending set through the collaborator.
    ///
    /// On any backup or write error nothing changes and the caller
    /// loses no work. On success, written edits become the new
    /// committed baseline; failed edits stay pending with their
    /// reasons reported.
    pub fn commit(&mut self, sink: &mut dyn EditSink) -> Result<CommitReport, EngineError> {
        let edits = self.pending_edits();
        if edits.is_empty() {
            return Err(EngineError::SessionState("no pending edits to commit".into()));
        }

        let backup_file = sink
            .backup()
            .map_err(|reason| EngineError::Persistence { reason })?;
        let outcome = sink
            .persist(&edits)
            .map_err(|reason| EngineError::Persistence { reason })?;

        for identifier in &outcome.committed {
            let key = normalize_tag(identifier);
            if let Some(edit) = self.pending.remove(&key) {
                self.committed.insert(key, edit.hw_rows);
            }
        }

        Ok(CommitReport {
            committed_count: outcome.committed.len(),
            failures: outcome.failures,
            backup_file,
        })
    }
}
