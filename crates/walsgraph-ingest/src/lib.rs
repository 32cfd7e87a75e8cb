//! WALS ingestion for walsgraph
//!
//! Turns a CLDF `languages.csv` into `Language` nodes in a [`GraphStore`]:
//!
//! - `record`: CSV rows with the dataset's column names
//! - `normalize`: one row -> one canonical `LanguageNode` (or a skip reason)
//! - `writer`: keyed batch upserts and delete-all
//! - `pipeline`: the rebuild state machine with chunk retries
//!
//! Every build is a full rebuild: the store is cleared first, then filled.

pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod writer;

pub use config::BuildConfig;
pub use error::{BuildError, ValidationError};
pub use normalize::{NormalizeOutcome, Normalizer};
pub use pipeline::Pipeline;
pub use record::LanguageRecord;
pub use report::{BuildReport, BuildState, ChunkFailure};
pub use writer::{BatchResult, GraphWriter};

use std::path::Path;
use walsgraph_storage::{GraphStore, SnapshotStore, StoreConfig};

/// Rebuild `store` from the dataset at `dataset`.
pub fn run_build<S: GraphStore>(
    store: S,
    dataset: &Path,
    config: &BuildConfig,
) -> Result<BuildReport, BuildError> {
    Pipeline::new(store, config.clone()).run(dataset)
}

/// Open the snapshot store described by `store_config` and rebuild it.
///
/// The store is released when this returns, on success and on failure.
pub fn run_build_at(
    store_config: &StoreConfig,
    dataset: &Path,
    config: &BuildConfig,
) -> Result<BuildReport, BuildError> {
    let store = SnapshotStore::open(store_config).map_err(BuildError::Connect)?;
    run_build(store, dataset, config)
}
