//! Walsgraph storage layer
//!
//! ```text
//! ┌──────────────┐   upsert_nodes    ┌──────────────────────┐   flush   ┌──────────────┐
//! │  ingest      │──────────────────►│                      │──────────►│  .wgdb file  │
//! │  pipeline    │   clear_all       │    SnapshotStore     │           │  (PathDB)    │
//! └──────────────┘                   │  Arc<RwLock<PathDB>> │           └──────────────┘
//! ┌──────────────┐   query           │                      │           ┌──────────────┐
//! │  query       │──────────────────►│                      │──────────►│ .report.json │
//! │  executor    │   last_build      └──────────────────────┘           │ (last build) │
//! └──────────────┘                                                      └──────────────┘
//! ```
//!
//! `GraphStore` is the whole contract the build and query paths rely on:
//! keyed upsert, delete-all, and a structured query with equality and
//! substring filters plus count/group-by. `SnapshotStore` implements it over
//! an in-process PathDB persisted as one binary file.

pub mod error;
pub mod node;
pub mod summary;


pub use error::StoreError;
pub use node::{attr, Coordinates, LanguageNode, LANGUAGE_TYPE};
pub use summary::BuildSummary;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walsgraph_pathdb::{PathDB, PathQuery, QueryRows};

// ============================================================================
// Store Contract
// ============================================================================

/// The property-graph operations the build and query paths need.
pub trait GraphStore {
    /// Remove every node. Returns how many were removed.
    fn clear_all(&self) -> Result<usize, StoreError>;

    /// Upsert nodes by `id`.
    ///
    /// The outer error means the whole batch failed (e.g. the connection
    /// dropped); the inner results report each node in input order.
    fn upsert_nodes(
        &self,
        nodes: &[LanguageNode],
    ) -> Result<Vec<Result<(), StoreError>>, StoreError>;

    fn get_node(&self, id: &str) -> Result<Option<LanguageNode>, StoreError>;

    /// Evaluate a read-only structured query.
    fn query(&self, query: &PathQuery) -> Result<QueryRows, StoreError>;

    fn node_count(&self) -> Result<usize, StoreError>;

    /// Make everything written so far durable.
    fn commit(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn record_build(&self, _summary: &BuildSummary) -> Result<(), StoreError> {
        Ok(())
    }

    fn last_build(&self) -> Result<Option<BuildSummary>, StoreError> {
        Ok(None)
    }
}

impl<S: GraphStore + ?Sized> GraphStore for &S {
    fn clear_all(&self) -> Result<usize, StoreError> {
        (**self).clear_all()
    }

    fn upsert_nodes(
        &self,
        nodes: &[LanguageNode],
    ) -> Result<Vec<Result<(), StoreError>>, StoreError> {
        (**self).upsert_nodes(nodes)
    }

    fn get_node(&self, id: &str) -> Result<Option<LanguageNode>, StoreError> {
        (**self).get_node(id)
    }

    fn query(&self, query: &PathQuery) -> Result<QueryRows, StoreError> {
        (**self).query(query)
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        (**self).node_count()
    }

    fn commit(&self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn record_build(&self, summary: &BuildSummary) -> Result<(), StoreError> {
        (**self).record_build(summary)
    }

    fn last_build(&self) -> Result<Option<BuildSummary>, StoreError> {
        (**self).last_build()
    }
}

// ============================================================================
// Storage Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the PathDB snapshot file
    pub path: PathBuf,
    /// Start from an empty store when the file does not exist yet
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./walsgraph.wgdb"),
            create_if_missing: true,
        }
    }
}

// ============================================================================
// Snapshot Store
// ============================================================================

/// File-backed store: an in-memory PathDB that is written back on `commit`.
///
/// Dropping the store releases it without writing; only committed state
/// reaches disk.
pub struct SnapshotStore {
    /// Snapshot location; `None` for a purely in-memory store
    path: Option<PathBuf>,
    pathdb: Arc<RwLock<PathDB>>,
}

impl SnapshotStore {
    /// Open the snapshot at `config.path`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.clone();
        let pathdb = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
            PathDB::from_bytes(&bytes).map_err(|e| StoreError::Snapshot {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else if config.create_if_missing {
            tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
            PathDB::new()
        } else {
            return Err(StoreError::Fatal(format!(
                "store {} does not exist",
                path.display()
            )));
        };

        Ok(Self {
            path: Some(path),
            pathdb: Arc::new(RwLock::new(pathdb)),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            pathdb: Arc::new(RwLock::new(PathDB::new())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get PathDB for direct reads
    pub fn pathdb(&self) -> Arc<RwLock<PathDB>> {
        Arc::clone(&self.pathdb)
    }

    /// Where the last build summary lives: `<snapshot>.report.json`.
    pub fn report_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|p| {
            let mut name = p.as_os_str().to_owned();
            name.push(".report.json");
            PathBuf::from(name)
        })
    }

    /// Write the snapshot atomically (temp file, then rename).
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = self.pathdb.read().to_bytes().map_err(|e| StoreError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(path, &bytes)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

impl GraphStore for SnapshotStore {
    fn clear_all(&self) -> Result<usize, StoreError> {
        let removed = self.pathdb.write().clear();
        tracing::debug!(removed, "cleared store");
        Ok(removed)
    }

    fn upsert_nodes(
        &self,
        nodes: &[LanguageNode],
    ) -> Result<Vec<Result<(), StoreError>>, StoreError> {
        let mut pathdb = self.pathdb.write();
        let results = nodes
            .iter()
            .map(|node| {
                let attrs = node.to_attrs();
                let attrs: Vec<(&str, &str)> =
                    attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
                pathdb
                    .upsert_entity(LANGUAGE_TYPE, &node.id, attrs)
                    .map(|_| ())
                    .map_err(|e| StoreError::Rejected {
                        id: node.id.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect();
        Ok(results)
    }

    fn get_node(&self, id: &str) -> Result<Option<LanguageNode>, StoreError> {
        let pathdb = self.pathdb.read();
        Ok(pathdb
            .find_by_key(LANGUAGE_TYPE, id)
            .and_then(|entity| pathdb.get_entity(entity))
            .and_then(|view| LanguageNode::from_view(&view)))
    }

    fn query(&self, query: &PathQuery) -> Result<QueryRows, StoreError> {
        Ok(self.pathdb.read().execute(query))
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        Ok(self.pathdb.read().count_of_type(LANGUAGE_TYPE))
    }

    fn commit(&self) -> Result<(), StoreError> {
        self.flush()
    }

    fn record_build(&self, summary: &BuildSummary) -> Result<(), StoreError> {
        let Some(path) = self.report_path() else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(summary).map_err(|e| StoreError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, &json)
    }

    fn last_build(&self) -> Result<Option<BuildSummary>, StoreError> {
        let Some(path) = self.report_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        match serde_json::from_str(&contents) {
            Ok(summary) => Ok(Some(summary)),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable build report"
                );
                Ok(None)
            }
        }
    }
}
