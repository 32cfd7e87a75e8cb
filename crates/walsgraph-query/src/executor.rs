//! Turn a `ResolvedQuery` into rows read from a `GraphStore`.
//!
//! Every path is read-only: the executor only ever calls `GraphStore::query`,
//! `node_count` and `last_build`.

use crate::error::QueryError;
use crate::resolver::{Intent, ResolvedQuery};
use crate::sqlish::parse_sqlish_query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use walsgraph_geo::{CountryCode, Place};
use walsgraph_pathdb::{AttrPredicate, OrderKey, PathQuery, Projection, QueryRows};
use walsgraph_storage::{attr, BuildSummary, GraphStore, StoreError, LANGUAGE_TYPE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Rows shown for list results before truncating.
    pub list_limit: usize,
    /// Families listed in statistics.
    pub top_families: usize,
    /// Countries listed in statistics.
    pub top_countries: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            list_limit: 20,
            top_families: 8,
            top_countries: 8,
        }
    }
}

/// Share of nodes carrying one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCoverage {
    pub label: &'static str,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    /// Every macroarea bucket, including `Unknown`, so counts sum to `total`.
    pub by_macroarea: Vec<(String, usize)>,
    pub top_families: Vec<(String, usize)>,
    /// Country names with the most languages, by primary country.
    pub top_countries: Vec<(String, usize)>,
    pub field_coverage: Vec<FieldCoverage>,
    /// Written / total records of the last build, or the with-country share.
    pub coverage_pct: f64,
    pub last_build: Option<BuildSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    /// Number of matching rows (before any display truncation).
    pub total: usize,
    pub message: String,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub intent: Intent,
    /// The structured query that ran, rendered as SQL.
    pub query: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: QuerySummary,
}

/// Label for nodes with no macroarea.
pub const UNKNOWN_BUCKET: &str = "Unknown";

const LIST_COLUMNS: [&str; 4] = [attr::ID, attr::FAMILY, attr::GENUS, attr::MACROAREA];

const COVERAGE_FIELDS: [(&str, &str); 7] = [
    (attr::COUNTRY_ID, "country"),
    (attr::MACROAREA, "macroarea"),
    (attr::FAMILY, "family"),
    (attr::SUBFAMILY, "subfamily"),
    (attr::GENUS, "genus"),
    (attr::LATITUDE, "coordinates"),
    (attr::ISO_CODE, "ISO code"),
];

pub struct QueryExecutor<S> {
    store: S,
    config: QueryConfig,
}

impl<S: GraphStore> QueryExecutor<S> {
    pub fn new(store: S, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn execute(&self, resolved: &ResolvedQuery) -> Result<QueryResult, QueryError> {
        tracing::debug!(intent = %resolved.intent(), "executing query");
        match resolved {
            ResolvedQuery::Geographic { place_text, place } => self.geographic(place_text, place),
            ResolvedQuery::Family { family } => self.family(family),
            ResolvedQuery::Statistics => self.statistics(),
            ResolvedQuery::Raw { query } => self.raw(query),
        }
    }

    fn geographic(&self, place_text: &str, place: &Place) -> Result<QueryResult, QueryError> {
        let (predicate, name) = match place {
            Place::Country(code) => (AttrPredicate::eq(attr::COUNTRY_ID, code.as_str()), code.name()),
            Place::Macroarea(m) => (AttrPredicate::eq(attr::MACROAREA, m.label()), m.label()),
            Place::Unresolved => {
                return Ok(QueryResult {
                    intent: Intent::Geographic,
                    query: None,
                    columns: list_columns(),
                    rows: Vec::new(),
                    summary: QuerySummary {
                        total: 0,
                        message: format!("No country or region matches '{place_text}'"),
                        statistics: None,
                    },
                });
            }
        };

        let mut queries = vec![list_query().filter(predicate)];
        // Languages spoken in several countries list the others in `countries`.
        if let Place::Country(code) = place {
            queries.push(list_query().filter(AttrPredicate::contains(attr::COUNTRIES, code.as_str())));
        }
        let (columns, rows) = self.union_by_id(&queries)?;
        let total = rows.len();
        Ok(QueryResult {
            intent: Intent::Geographic,
            query: Some(join_queries(&queries)),
            columns,
            rows,
            summary: QuerySummary {
                total,
                message: format!("{total} languages in {name}"),
                statistics: None,
            },
        })
    }

    fn family(&self, family: &str) -> Result<QueryResult, QueryError> {
        let queries = [
            list_query().filter(AttrPredicate::contains(attr::FAMILY, family)),
            list_query().filter(AttrPredicate::contains(attr::GENUS, family)),
        ];
        let (columns, rows) = self.union_by_id(&queries)?;
        let total = rows.len();
        Ok(QueryResult {
            intent: Intent::Family,
            query: Some(join_queries(&queries)),
            columns,
            rows,
            summary: QuerySummary {
                total,
                message: format!("{total} languages in family or genus matching '{family}'"),
                statistics: None,
            },
        })
    }

    fn statistics(&self) -> Result<QueryResult, QueryError> {
        let total = self.store.node_count()?;

        let by_macroarea: Vec<(String, usize)> = self
            .group(attr::MACROAREA)?
            .into_iter()
            .map(|(value, n)| {
                let label = if value.is_empty() {
                    UNKNOWN_BUCKET.to_string()
                } else {
                    value
                };
                (label, n)
            })
            .collect();

        let top_families: Vec<(String, usize)> = self
            .group(attr::FAMILY)?
            .into_iter()
            .filter(|(value, _)| !value.is_empty())
            .take(self.config.top_families)
            .collect();

        let top_countries: Vec<(String, usize)> = self
            .group(attr::COUNTRY_ID)?
            .into_iter()
            .filter_map(|(code, n)| Some((CountryCode::from_code(&code)?.name().to_string(), n)))
            .take(self.config.top_countries)
            .collect();

        let mut field_coverage = Vec::with_capacity(COVERAGE_FIELDS.len());
        for (key, label) in COVERAGE_FIELDS {
            let count = self.count_where(AttrPredicate::IsSet { key: key.to_string() })?;
            field_coverage.push(FieldCoverage {
                label,
                count,
                pct: percent(count, total),
            });
        }

        let last_build = self.store.last_build()?;
        let coverage_pct = match &last_build {
            Some(build) => build.coverage * 100.0,
            None => field_coverage.first().map_or(0.0, |c| c.pct),
        };

        let columns = vec!["macroarea".to_string(), "count".to_string()];
        let rows = by_macroarea
            .iter()
            .map(|(label, n)| vec![label.clone(), n.to_string()])
            .collect();

        Ok(QueryResult {
            intent: Intent::Statistics,
            query: None,
            columns,
            rows,
            summary: QuerySummary {
                total,
                message: format!("{total} languages, {coverage_pct:.1}% coverage"),
                statistics: Some(Statistics {
                    total,
                    by_macroarea,
                    top_families,
                    top_countries,
                    field_coverage,
                    coverage_pct,
                    last_build,
                }),
            },
        })
    }

    fn raw(&self, text: &str) -> Result<QueryResult, QueryError> {
        let query = parse_sqlish_query(text)?;
        let rows = self.store.query(&query)?;
        let total = rows.len();
        Ok(QueryResult {
            intent: Intent::Raw,
            query: Some(query.to_string()),
            columns: rows.columns,
            rows: rows.rows,
            summary: QuerySummary {
                total,
                message: format!("{total} rows"),
                statistics: None,
            },
        })
    }

    /// Run each query and merge the rows by id, ordered by id.
    fn union_by_id(&self, queries: &[PathQuery]) -> Result<(Vec<String>, Vec<Vec<String>>), QueryError> {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut columns = list_columns();
        for query in queries {
            let QueryRows { columns: cols, rows } = self.store.query(query)?;
            columns = cols;
            for row in rows {
                if let Some(id) = row.first() {
                    merged.entry(id.clone()).or_insert(row);
                }
            }
        }
        Ok((columns, merged.into_values().collect()))
    }

    fn group(&self, key: &str) -> Result<Vec<(String, usize)>, QueryError> {
        let query = PathQuery::new(LANGUAGE_TYPE)
            .select(Projection::GroupCount {
                key: key.to_string(),
            })
            .order_by(OrderKey::Count, true);
        let rows = self.store.query(&query)?;
        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| {
                let mut it = row.into_iter();
                let value = it.next()?;
                let n = it.next()?.parse().ok()?;
                Some((value, n))
            })
            .collect())
    }

    fn count_where(&self, predicate: AttrPredicate) -> Result<usize, QueryError> {
        let query = PathQuery::new(LANGUAGE_TYPE)
            .filter(predicate)
            .select(Projection::Count);
        let rows = self.store.query(&query)?;
        rows.rows
            .first()
            .and_then(|row| row.first())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| StoreError::Query("count query returned no rows".to_string()).into())
    }
}

fn list_query() -> PathQuery {
    PathQuery::new(LANGUAGE_TYPE)
        .select(Projection::Attrs(list_columns()))
        .order_by(OrderKey::Attr(attr::ID.to_string()), false)
}

fn join_queries(queries: &[PathQuery]) -> String {
    queries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn list_columns() -> Vec<String> {
    LIST_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
