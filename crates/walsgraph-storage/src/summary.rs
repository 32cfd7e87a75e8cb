use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the store remembers about the last build run.
///
/// Kept next to the snapshot as JSON so query-time statistics can report
/// build coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: String,
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unresolved_geography: usize,
    pub coverage: f64,
}
