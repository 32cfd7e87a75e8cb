use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use walsgraph_storage::BuildSummary;

/// Where a build run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    Idle,
    Clearing,
    Processing,
    Finalizing,
    Completed,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Completed | BuildState::Failed)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A chunk whose write never succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// 0-based chunk index
    pub index: usize,
    /// Nodes in the chunk
    pub records: usize,
    pub attempts: u32,
    pub error: String,
}

/// Counters and outcome of one build run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: BuildState,
    /// Rows read from the dataset, malformed ones included
    pub total: usize,
    pub normalized: usize,
    pub written: usize,
    /// Rows rejected by validation
    pub skipped: usize,
    /// Nodes whose write failed
    pub failed: usize,
    pub unresolved_geography: usize,
    pub coordinates_dropped: usize,
    /// Normalized rows whose id repeats an earlier row; the later row wins
    pub duplicate_ids: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    /// `written / total`, in [0, 1]
    pub coverage: f64,
}

impl BuildReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            state: BuildState::Idle,
            total: 0,
            normalized: 0,
            written: 0,
            skipped: 0,
            failed: 0,
            unresolved_geography: 0,
            coordinates_dropped: 0,
            duplicate_ids: 0,
            failed_chunks: Vec::new(),
            coverage: 0.0,
        }
    }

    pub fn coverage_pct(&self) -> f64 {
        self.coverage * 100.0
    }

    /// The part of the report the store keeps for query-time statistics.
    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or(self.started_at),
            state: self.state.to_string(),
            total: self.total,
            written: self.written,
            skipped: self.skipped,
            failed: self.failed,
            unresolved_geography: self.unresolved_geography,
            coverage: self.coverage,
        }
    }
}

impl Default for BuildReport {
    fn default() -> Self {
        Self::new()
    }
}
