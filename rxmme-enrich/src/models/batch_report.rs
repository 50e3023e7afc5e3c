//! Batch run outcome and summary

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BatchOutcome {
    /// Every identifier was processed or skipped
    Completed,
    /// Stopped by a cancellation request before the list was exhausted
    Cancelled,
    /// Stopped on the first hard error; `ndc` is absent from the store
    Aborted { ndc: String, error: String },
}

impl BatchOutcome {
    /// Short name persisted in `batch_runs.outcome`
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOutcome::Completed => "completed",
            BatchOutcome::Cancelled => "cancelled",
            BatchOutcome::Aborted { .. } => "aborted",
        }
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub outcome: BatchOutcome,
    /// Identifiers enriched during this run
    pub processed: usize,
    /// Identifiers skipped because they were already stored
    pub skipped: usize,
    /// Records in the store after the run
    pub total_records: usize,
}

impl BatchReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Aborted { .. })
    }
}
