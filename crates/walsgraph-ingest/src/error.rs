use std::path::PathBuf;
use walsgraph_storage::StoreError;

/// Why a single raw record was not turned into a node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("record has neither a name nor a WALS code")]
    MissingIdentifier,

    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: String, longitude: String },

    #[error("malformed row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },
}

/// Errors that end a build run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot read dataset {path}: {source}")]
    DatasetUnreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("clearing the store failed: {0}")]
    Clearing(#[source] StoreError),

    #[error("cannot open store: {0}")]
    Connect(#[source] StoreError),

    #[error("committing the build failed: {0}")]
    Commit(#[source] StoreError),
}
