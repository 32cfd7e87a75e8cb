use walsgraph_storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The raw query text is not valid SQL.
    #[error("failed to parse query: {0}")]
    Parse(String),

    /// Valid SQL outside the supported surface.
    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
