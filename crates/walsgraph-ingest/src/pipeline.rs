//! The build run: read, clear, normalize + write in chunks, finalize.
//!
//! ```text
//! Idle ──► Clearing ──► Processing ──► Finalizing ──► Completed
//!   │          │                            │
//!   └──────────┴────────────────────────────┴──────► Failed
//! ```
//!
//! Only an unreadable dataset, a failed clear, or a failed commit ends in
//! `Failed`. Chunks that still fail after their retries are recorded in the
//! report and the run moves on; nothing already written is rolled back.

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::normalize::Normalizer;
use crate::record::{read_records, RawRow};
use crate::report::{BuildReport, BuildState, ChunkFailure};
use crate::writer::{BatchResult, GraphWriter};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::thread;
use tracing::{debug, info, warn};
use walsgraph_geo::GeoResolver;
use walsgraph_storage::{GraphStore, LanguageNode, StoreError};

pub struct Pipeline<S> {
    writer: GraphWriter<S>,
    config: BuildConfig,
    resolver: &'static GeoResolver,
    state: BuildState,
}

impl<S: GraphStore> Pipeline<S> {
    pub fn new(store: S, config: BuildConfig) -> Self {
        Self {
            writer: GraphWriter::new(store),
            config,
            resolver: GeoResolver::global(),
            state: BuildState::Idle,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn store(&self) -> &S {
        self.writer.store()
    }

    /// Run a full rebuild from the dataset file at `path`.
    pub fn run(&mut self, path: &Path) -> Result<BuildReport, BuildError> {
        info!(path = %path.display(), "reading dataset");
        let rows = match read_records(path) {
            Ok(rows) => rows,
            Err(err) => return Err(self.fail(err)),
        };
        self.run_rows(rows)
    }

    /// Run a full rebuild from rows already read.
    pub fn run_rows(&mut self, rows: Vec<RawRow>) -> Result<BuildReport, BuildError> {
        let mut report = BuildReport::new();

        self.transition(BuildState::Clearing, &mut report);
        match self.writer.clear_all() {
            Ok(removed) => info!(removed, "cleared store"),
            Err(err) => return Err(self.fail(BuildError::Clearing(err))),
        }

        self.transition(BuildState::Processing, &mut report);
        report.total = rows.len();
        let nodes = self.normalize_all(rows, &mut report);

        let batch_size = self.config.effective_batch_size();
        for (index, chunk) in nodes.chunks(batch_size).enumerate() {
            match self.write_chunk(index, chunk) {
                Ok(batch) => {
                    report.written += batch.succeeded;
                    report.failed += batch.failed;
                    for (id, err) in &batch.errors {
                        debug!(chunk = index, id = %id, error = %err, "node write failed");
                    }
                }
                Err((attempts, err)) => {
                    warn!(
                        chunk = index,
                        records = chunk.len(),
                        attempts,
                        error = %err,
                        "giving up on chunk"
                    );
                    report.failed += chunk.len();
                    report.failed_chunks.push(ChunkFailure {
                        index,
                        records: chunk.len(),
                        attempts,
                        error: err.to_string(),
                    });
                }
            }
        }

        self.transition(BuildState::Finalizing, &mut report);
        report.coverage = if report.total == 0 {
            0.0
        } else {
            report.written as f64 / report.total as f64
        };
        if let Err(err) = self.writer.store().commit() {
            return Err(self.fail(BuildError::Commit(err)));
        }

        report.finished_at = Some(Utc::now());
        self.transition(BuildState::Completed, &mut report);
        if let Err(err) = self.writer.store().record_build(&report.summary()) {
            warn!(error = %err, "could not persist build report");
        }

        info!(
            total = report.total,
            written = report.written,
            skipped = report.skipped,
            failed = report.failed,
            unresolved_geography = report.unresolved_geography,
            coverage_pct = report.coverage_pct(),
            "build finished"
        );
        Ok(report)
    }

    fn normalize_all(&self, rows: Vec<RawRow>, report: &mut BuildReport) -> Vec<LanguageNode> {
        let normalizer =
            Normalizer::new(self.resolver).require_name(self.config.require_identifier_name);
        // id -> position in `nodes`; a repeated id replaces the earlier node in place.
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut nodes: Vec<LanguageNode> = Vec::with_capacity(rows.len());

        for (row_idx, row) in rows.into_iter().enumerate() {
            let outcome = row.and_then(|record| normalizer.normalize(&record));
            match outcome {
                Ok(outcome) => {
                    report.normalized += 1;
                    if !outcome.geography_resolved {
                        report.unresolved_geography += 1;
                    }
                    if outcome.coordinates_dropped {
                        report.coordinates_dropped += 1;
                    }
                    match seen.get(&outcome.node.id) {
                        Some(&pos) => {
                            debug!(
                                row = row_idx,
                                id = %outcome.node.id,
                                "duplicate id, keeping last row"
                            );
                            report.duplicate_ids += 1;
                            nodes[pos] = outcome.node;
                        }
                        None => {
                            seen.insert(outcome.node.id.clone(), nodes.len());
                            nodes.push(outcome.node);
                        }
                    }
                }
                Err(err) => {
                    debug!(row = row_idx, error = %err, "skipping record");
                    report.skipped += 1;
                }
            }
        }
        nodes
    }

    /// Write one chunk, retrying transient failures with exponential backoff.
    ///
    /// On failure returns the number of attempts made and the last error.
    fn write_chunk(
        &self,
        index: usize,
        nodes: &[LanguageNode],
    ) -> Result<BatchResult, (u32, StoreError)> {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.writer.upsert_batch(nodes) {
                Ok(batch) => return Ok(batch),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        chunk = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "chunk write failed, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(err) => return Err((attempt, err)),
            }
        }
    }

    fn transition(&mut self, next: BuildState, report: &mut BuildReport) {
        info!(from = %self.state, to = %next, "build state");
        self.state = next;
        report.state = next;
    }

    fn fail(&mut self, err: BuildError) -> BuildError {
        warn!(from = %self.state, error = %err, "build failed");
        self.state = BuildState::Failed;
        err
    }
}
