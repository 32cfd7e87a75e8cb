//! Question answering over the walsgraph store
//!
//! ```text
//! question ──► QueryResolver ──► ResolvedQuery ──► QueryExecutor ──► QueryResult
//!                 │                                    │
//!                 ├─ families (aliases)                ├─ PathQuery via GraphStore::query
//!                 └─ walsgraph-geo (places)            └─ sqlish (raw SELECT text)
//! ```
//!
//! Resolution is deterministic keyword matching; execution is read-only.

pub mod error;
pub mod executor;
pub mod families;
pub mod render;
pub mod resolver;
pub mod sqlish;

pub use error::QueryError;
pub use executor::{FieldCoverage, QueryConfig, QueryExecutor, QueryResult, QuerySummary, Statistics};
pub use render::render;
pub use resolver::{Intent, QueryResolver, ResolvedQuery};
pub use sqlish::parse_sqlish_query;

use walsgraph_storage::GraphStore;

/// Resolve a natural-language question and run it against `store`.
pub fn run_query<S: GraphStore>(
    store: S,
    question: &str,
    config: &QueryConfig,
) -> Result<QueryResult, QueryError> {
    let resolved = QueryResolver::default().resolve(question);
    tracing::info!(intent = %resolved.intent(), "resolved question");
    QueryExecutor::new(store, config.clone()).execute(&resolved)
}

/// Run a structured query string directly, skipping resolution.
///
/// The text is trusted input: it is parsed and executed as written.
pub fn run_raw_query<S: GraphStore>(
    store: S,
    query: &str,
    config: &QueryConfig,
) -> Result<QueryResult, QueryError> {
    QueryExecutor::new(store, config.clone()).execute(&ResolvedQuery::Raw {
        query: query.to_string(),
    })
}
