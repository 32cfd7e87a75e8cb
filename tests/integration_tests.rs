//! Integration tests for the complete walsgraph pipeline
//!
//! These tests run across crates:
//! - CSV dataset → Normalizer → GraphWriter → SnapshotStore (on disk)
//! - question → QueryResolver → QueryExecutor → rows
//!
//! Run with: cargo test --test integration_tests

use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use walsgraph_geo::{CountryCode, GeoResolver, Place};
use walsgraph_ingest::{run_build, run_build_at, BuildConfig, BuildState};
use walsgraph_pathdb::{PathQuery, QueryRows};
use walsgraph_query::{run_query, run_raw_query, Intent, QueryConfig};
use walsgraph_storage::{
    BuildSummary, GraphStore, LanguageNode, SnapshotStore, StoreConfig, StoreError,
};

const HEADER: &str =
    "ID,Name,Macroarea,Latitude,Longitude,Glottocode,ISO639P3code,Family,Subfamily,Genus,Country_ID";

fn write_dataset(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// 15 languages of Spain plus a handful elsewhere.
fn spain_fixture() -> NamedTempFile {
    let mut rows: Vec<String> = (0..15)
        .map(|i| format!("sp{i},Iberian {i:02},Eurasia,40.{i},-3.{i},,,Indo-European,,Romance,ES"))
        .collect();
    rows.extend([
        "fre,French,Eurasia,48,2,,fra,Romance languages,,,FR".to_string(),
        "occ,Occitan,Eurasia,44,2,,oci,romance,,,FR".to_string(),
        "ger,German,Eurasia,52,10,,deu,Indo-European,,Germanic,DE".to_string(),
        "swa,Swahili,Africa,-6.5,39,,swh,Niger-Congo,,Bantoid,TZ".to_string(),
        "ykm,Yukam,Papunesia,-5,145,,,Trans-New Guinea,,,PG".to_string(),
        "zzz,Nowhere,,,,,,,,,".to_string(),
        ",,Eurasia,1,1,,,,,,ES".to_string(),
        "bad,Badcoords,Eurasia,123,456,,,Isolate,,,ES".to_string(),
    ]);
    write_dataset(&rows)
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

fn built_store(dir: &std::path::Path) -> (SnapshotStore, StoreConfig) {
    let dataset = spain_fixture();
    let config = StoreConfig {
        path: dir.join("wals.wgdb"),
        create_if_missing: true,
    };
    let report = run_build_at(&config, dataset.path(), &quick(4)).unwrap();
    assert_eq!(report.state, BuildState::Completed);
    (SnapshotStore::open(&config).unwrap(), config)
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn test_build_report_counts() {
    let dir = tempdir().unwrap();
    let dataset = spain_fixture();
    let config = StoreConfig {
        path: dir.path().join("wals.wgdb"),
        create_if_missing: true,
    };
    let report = run_build_at(&config, dataset.path(), &quick(4)).unwrap();

    assert_eq!(report.total, 23);
    // The row with neither name nor code is skipped.
    assert_eq!(report.skipped, 1);
    assert_eq!(report.written, 22);
    assert_eq!(report.failed, 0);
    assert_eq!(report.unresolved_geography, 1);
    assert_eq!(report.coordinates_dropped, 1);
    assert!((report.coverage - 22.0 / 23.0).abs() < 1e-9);

    let store = SnapshotStore::open(&config).unwrap();
    let bad = store.get_node("Badcoords").unwrap().unwrap();
    assert!(bad.coordinates.is_none());
    assert_eq!(bad.country_id, CountryCode::from_code("ES"));
}

#[test]
fn test_rebuild_twice_writes_the_same_count() {
    let dir = tempdir().unwrap();
    let dataset = spain_fixture();
    let config = StoreConfig {
        path: dir.path().join("wals.wgdb"),
        create_if_missing: true,
    };
    let first = run_build_at(&config, dataset.path(), &quick(5)).unwrap();
    let second = run_build_at(&config, dataset.path(), &quick(5)).unwrap();
    assert_eq!(first.written, second.written);
    assert_eq!(
        SnapshotStore::open(&config).unwrap().node_count().unwrap(),
        second.written
    );
}

/// Fails every batch that contains `poison`.
struct PoisonedStore {
    inner: SnapshotStore,
    poison: &'static str,
}

impl GraphStore for PoisonedStore {
    fn clear_all(&self) -> Result<usize, StoreError> {
        self.inner.clear_all()
    }

    fn upsert_nodes(
        &self,
        nodes: &[LanguageNode],
    ) -> Result<Vec<Result<(), StoreError>>, StoreError> {
        if nodes.iter().any(|n| n.id == self.poison) {
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

#[test]
fn test_failed_chunk_only_loses_its_own_records() {
    let rows: Vec<String> = (0..10)
        .map(|i| format!("c{i},Lang{i},Eurasia,1,1,,,Fam,,,ES"))
        .collect();
    let dataset = write_dataset(&rows);
    let store = PoisonedStore {
        inner: SnapshotStore::in_memory(),
        poison: "Lang5",
    };
    // Chunks of 3: [0,1,2] [3,4,5] [6,7,8] [9]; the second always fails.
    let report = run_build(&store, dataset.path(), &quick(3)).unwrap();

    assert_eq!(report.state, BuildState::Completed);
    assert_eq!(report.written, 7);
    assert_eq!(report.failed, 3);
    assert_eq!(report.failed_chunks.len(), 1);
    assert_eq!(report.failed_chunks[0].index, 1);
    for id in ["Lang6", "Lang7", "Lang8", "Lang9"] {
        assert!(store.get_node(id).unwrap().is_some(), "{id} missing");
    }
}

// ============================================================================
// Query
// ============================================================================

#[test]
fn test_spain_returns_exactly_the_spanish_records() {
    let dir = tempdir().unwrap();
    let (store, _) = built_store(dir.path());
    let result = run_query(&store, "Which languages are spoken in Spain?", &QueryConfig::default())
        .unwrap();

    assert_eq!(result.intent, Intent::Geographic);
    // 15 Iberian rows plus Badcoords, which kept its country.
    assert_eq!(result.summary.total, 16);
    let iberian = result
        .rows
        .iter()
        .filter(|r| r[0].starts_with("Iberian"))
        .count();
    assert_eq!(iberian, 15);
}

#[test]
fn test_romance_matches_case_insensitive_substrings() {
    let dir = tempdir().unwrap();
    let (store, _) = built_store(dir.path());
    let result = run_query(&store, "Show me Romance languages", &QueryConfig::default()).unwrap();

    assert_eq!(result.intent, Intent::Family);
    let ids: Vec<&str> = result.rows.iter().map(|r| r[0].as_str()).collect();
    assert!(ids.contains(&"French"), "family 'Romance languages'");
    assert!(ids.contains(&"Occitan"), "family 'romance'");
    assert!(ids.contains(&"Iberian 00"), "genus 'Romance'");
    assert_eq!(result.summary.total, 17);
}

#[test]
fn test_statistics_macroareas_sum_to_written() {
    let dir = tempdir().unwrap();
    let (store, _) = built_store(dir.path());
    let result = run_query(&store, "statistics please", &QueryConfig::default()).unwrap();
    let stats = result.summary.statistics.unwrap();

    let sum: usize = stats.by_macroarea.iter().map(|(_, n)| n).sum();
    assert_eq!(sum, 22);
    assert_eq!(stats.total, 22);
    // Coverage comes from the recorded build.
    let build = stats.last_build.unwrap();
    assert_eq!(build.written, 22);
    assert!((stats.coverage_pct - 100.0 * 22.0 / 23.0).abs() < 1e-9);
}

#[test]
fn test_repeated_ids_count_once_as_written() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(&[
        "s1,Same,Eurasia,40,-3,,,Indo-European,,Romance,ES".to_string(),
        "s2,Same,Africa,9,8,,,Niger-Congo,,Defoid,NG".to_string(),
        "oth,Other,Eurasia,52,10,,,Indo-European,,Germanic,DE".to_string(),
    ]);
    let config = StoreConfig {
        path: dir.path().join("wals.wgdb"),
        create_if_missing: true,
    };
    let report = run_build_at(&config, dataset.path(), &quick(2)).unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.duplicate_ids, 1);
    assert_eq!(report.written, 2);

    let store = SnapshotStore::open(&config).unwrap();
    assert_eq!(store.node_count().unwrap(), report.written);
    let same = store.get_node("Same").unwrap().unwrap();
    assert_eq!(same.country_id, CountryCode::from_code("NG"));

    let result = run_query(&store, "statistics please", &QueryConfig::default()).unwrap();
    let stats = result.summary.statistics.unwrap();
    let sum: usize = stats.by_macroarea.iter().map(|(_, n)| n).sum();
    assert_eq!(sum, report.written);
}

#[test]
fn test_atlantis_is_zero_rows_not_an_error() {
    let dir = tempdir().unwrap();
    let (store, _) = built_store(dir.path());
    assert_eq!(GeoResolver::global().resolve("Atlantis"), Place::Unresolved);
    let result = run_query(&store, "languages spoken in Atlantis", &QueryConfig::default()).unwrap();
    assert_eq!(result.intent, Intent::Geographic);
    assert!(result.rows.is_empty());
}

#[test]
fn test_country_aliases_agree() {
    let geo = GeoResolver::global();
    let de = Place::Country(CountryCode::from_code("DE").unwrap());
    for alias in ["Germany", "germany", "DE", "Deutschland"] {
        assert_eq!(geo.resolve(alias), de, "{alias}");
    }
}

#[test]
fn test_raw_query_reads_built_graph() {
    let dir = tempdir().unwrap();
    let (store, _) = built_store(dir.path());
    let result = run_raw_query(
        &store,
        "SELECT id FROM Language WHERE macroarea = 'Papunesia'",
        &QueryConfig::default(),
    )
    .unwrap();
    assert_eq!(result.rows, vec![vec!["Yukam".to_string()]]);
}
