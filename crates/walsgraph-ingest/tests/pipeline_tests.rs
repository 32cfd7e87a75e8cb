//! Build pipeline E2E tests with a fault-injecting store

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;
use walsgraph_ingest::*;
use walsgraph_pathdb::{PathQuery, QueryRows};
use walsgraph_storage::{
    BuildSummary, GraphStore, LanguageNode, SnapshotStore, StoreConfig, StoreError,
};

// ============================================================================
// Test double
// ============================================================================

/// Wraps an in-memory store and injects failures.
struct FlakyStore {
    inner: SnapshotStore,
    /// Fail this many batch writes (transiently) before succeeding
    transient_failures: AtomicUsize,
    /// Any batch containing this id fails every time
    poison_id: Option<String>,
    fail_clear: bool,
    batch_calls: AtomicUsize,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: SnapshotStore::in_memory(),
            transient_failures: AtomicUsize::new(0),
            poison_id: None,
            fail_clear: false,
            batch_calls: AtomicUsize::new(0),
        }
    }

    fn failing_first(n: usize) -> Self {
        let store = Self::new();
        store.transient_failures.store(n, Ordering::SeqCst);
        store
    }

    fn poisoned(id: &str) -> Self {
        Self {
            poison_id: Some(id.to_string()),
            ..Self::new()
        }
    }
}

impl GraphStore for FlakyStore {
    fn clear_all(&self) -> Result<usize, StoreError> {
        if self.fail_clear {
            return Err(StoreError::Fatal("connection refused".into()));
        }
        self.inner.clear_all()
    }

    fn upsert_nodes(
        &self,
        nodes: &[LanguageNode],
    ) -> Result<Vec<Result<(), StoreError>>, StoreError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(poison) = &self.poison_id {
            if nodes.iter().any(|n| &n.id == poison) {
                return Err(StoreError::Transient("write timed out".into()));
            }
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Transient("connection reset".into()));
        }
        self.inner.upsert_nodes(nodes)
    }

    fn get_node(&self, id: &str) -> Result<Option<LanguageNode>, StoreError> {
        self.inner.get_node(id)
    }

    fn query(&self, query: &PathQuery) -> Result<QueryRows, StoreError> {
        self.inner.query(query)
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        self.inner.node_count()
    }

    fn record_build(&self, summary: &BuildSummary) -> Result<(), StoreError> {
        self.inner.record_build(summary)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const HEADER: &str =
    "ID,Name,Macroarea,Latitude,Longitude,Glottocode,ISO639P3code,Family,Subfamily,Genus,Country_ID";

fn dataset(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn numbered_rows(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("l{i},Lang{i},Eurasia,10,10,,,Family{},,,ES", i % 3))
        .collect()
}

fn quick(batch_size: usize) -> BuildConfig {
    BuildConfig {
        batch_size,
        max_retries: 2,
        backoff_base_ms: 0,
        backoff_max_ms: 0,
        require_identifier_name: false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_normalized_records_are_found_by_id() {
    let file = dataset(&[
        "bsq,Basque,Eurasia,43,-3,basq1248,eus,Basque,,Basque,ES FR",
        "swa,Swahili,Africa,-6.5,39,swah1253,swh,Niger-Congo,,Bantoid,TZ",
        "xxx,,Eurasia,nan,nan,,,,,,",
    ]);
    let store = SnapshotStore::in_memory();
    let report = run_build(&store, file.path(), &quick(500)).unwrap();

    assert_eq!(report.written, 3);
    let basque = store.get_node("Basque").unwrap().unwrap();
    assert_eq!(basque.family, "Basque");
    assert_eq!(basque.iso_code.as_deref(), Some("eus"));
    assert_eq!(
        basque.countries.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
        vec!["ES", "FR"]
    );
    // Empty name falls back to the WALS code.
    assert!(store.get_node("xxx").unwrap().is_some());
}

#[test]
fn test_transient_failures_are_retried() {
    let file = dataset(&numbered_rows(4).iter().map(String::as_str).collect::<Vec<_>>());
    let store = FlakyStore::failing_first(2);
    let report = run_build(&store, file.path(), &quick(2)).unwrap();

    assert_eq!(report.written, 4);
    assert!(report.failed_chunks.is_empty());
    // Two failed attempts on chunk 0, then one success per chunk.
    assert_eq!(store.batch_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_exhausted_chunk_does_not_stop_later_chunks() {
    let rows = numbered_rows(6);
    let file = dataset(&rows.iter().map(String::as_str).collect::<Vec<_>>());
    // Lang2 lives in chunk 1 (rows 2 and 3) with batch size 2.
    let store = FlakyStore::poisoned("Lang2");
    let report = run_build(&store, file.path(), &quick(2)).unwrap();

    assert_eq!(report.state, BuildState::Completed);
    assert_eq!(report.total, 6);
    assert_eq!(report.written, 4);
    assert_eq!(report.failed, 2);
    assert_eq!(report.failed_chunks.len(), 1);
    assert_eq!(report.failed_chunks[0].index, 1);
    assert_eq!(report.failed_chunks[0].attempts, 3);
    assert!(store.get_node("Lang4").unwrap().is_some());
    assert!(store.get_node("Lang2").unwrap().is_none());
}

#[test]
fn test_failed_clear_aborts_without_writing() {
    let file = dataset(&["bsq,Basque,Eurasia,43,-3,,eus,Basque,,Basque,ES"]);
    let store = FlakyStore {
        fail_clear: true,
        ..FlakyStore::new()
    };
    let mut pipeline = Pipeline::new(&store, quick(10));
    let err = pipeline.run(file.path()).unwrap_err();

    assert!(matches!(err, BuildError::Clearing(_)));
    assert_eq!(pipeline.state(), BuildState::Failed);
    assert_eq!(store.batch_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rebuild_is_idempotent_on_disk() {
    let rows = numbered_rows(7);
    let file = dataset(&rows.iter().map(String::as_str).collect::<Vec<_>>());
    let dir = tempfile::tempdir().unwrap();
    let store_config = StoreConfig {
        path: dir.path().join("langs.wgdb"),
        create_if_missing: true,
    };

    let first = run_build_at(&store_config, file.path(), &quick(3)).unwrap();
    let second = run_build_at(&store_config, file.path(), &quick(3)).unwrap();
    assert_eq!(first.written, second.written);

    let store = SnapshotStore::open(&store_config).unwrap();
    assert_eq!(store.node_count().unwrap(), 7);
    let summary = store.last_build().unwrap().unwrap();
    assert_eq!(summary.run_id, second.run_id);
    assert_eq!(summary.written, 7);
}

#[test]
fn test_missing_store_is_a_connect_error() {
    let file = dataset(&[]);
    let dir = tempfile::tempdir().unwrap();
    let store_config = StoreConfig {
        path: dir.path().join("absent.wgdb"),
        create_if_missing: false,
    };
    let err = run_build_at(&store_config, file.path(), &quick(3)).unwrap_err();
    assert!(matches!(err, BuildError::Connect(_)));
}

#[test]
fn test_report_serializes() {
    let file = dataset(&["bsq,Basque,Eurasia,43,-3,,eus,Basque,,Basque,ES"]);
    let report = run_build(SnapshotStore::in_memory(), file.path(), &quick(10)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"], "Completed");
    assert_eq!(json["written"], 1);
}
