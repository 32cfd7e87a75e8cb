use std::path::PathBuf;

/// Errors at the graph store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not serve the request right now; retrying may succeed.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// The store is unusable (connection lost, cannot be opened).
    #[error("store unavailable: {0}")]
    Fatal(String),

    /// One node was refused by the store.
    #[error("node `{id}` rejected: {reason}")]
    Rejected { id: String, reason: String },

    /// A query the store cannot evaluate.
    #[error("query rejected: {0}")]
    Query(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

impl StoreError {
    /// Whether the failed operation is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transient(_) => true,
            StoreError::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
