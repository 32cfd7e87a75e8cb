//! Structured query IR over a `PathDB`.
//!
//! A `PathQuery` selects the entities of one type, narrows them with a
//! conjunction of attribute predicates, then projects attributes, a count,
//! or per-value group counts. Each predicate evaluates to a bitmap, so the
//! conjunction is a sequence of bitmap intersections.

use crate::PathDB;
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A single filter on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrPredicate {
    /// `attr == value` (exact match).
    Eq { key: String, value: String },
    /// `attr` contains `needle`, ignoring case.
    Contains { key: String, needle: String },
    /// `attr` is present.
    IsSet { key: String },
    /// `attr` is absent.
    IsUnset { key: String },
}

impl AttrPredicate {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn contains(key: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains {
            key: key.into(),
            needle: needle.into(),
        }
    }

    fn eval(&self, db: &PathDB, universe: &RoaringBitmap) -> RoaringBitmap {
        match self {
            AttrPredicate::Eq { key, value } => db.entities_with_attr_value(key, value),
            AttrPredicate::Contains { key, needle } => db.entities_with_attr_contains(key, needle),
            AttrPredicate::IsSet { key } => db.entities_with_attr(key),
            AttrPredicate::IsUnset { key } => universe - &db.entities_with_attr(key),
        }
    }
}

/// What a query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The listed attributes; an empty list means every attribute.
    Attrs(Vec<String>),
    /// A single `count` row.
    Count,
    /// One `(value, count)` row per distinct value of `key`.
    GroupCount { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    Attr(String),
    /// Only meaningful for `Projection::GroupCount`.
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub key: OrderKey,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    pub type_name: String,
    pub predicates: Vec<AttrPredicate>,
    pub projection: Projection,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl PathQuery {
    /// All attributes of every entity of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            predicates: Vec::new(),
            projection: Projection::Attrs(Vec::new()),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: AttrPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn order_by(mut self, key: OrderKey, descending: bool) -> Self {
        self.order_by = Some(OrderBy { key, descending });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.projection {
            Projection::Attrs(cols) if cols.is_empty() => write!(f, "SELECT *")?,
            Projection::Attrs(cols) => write!(f, "SELECT {}", cols.join(", "))?,
            Projection::Count => write!(f, "SELECT COUNT(*)")?,
            Projection::GroupCount { key } => write!(f, "SELECT {key}, COUNT(*)")?,
        }
        write!(f, " FROM {}", self.type_name)?;
        for (i, p) in self.predicates.iter().enumerate() {
            f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
            match p {
                AttrPredicate::Eq { key, value } => write!(f, "{key} = '{value}'")?,
                AttrPredicate::Contains { key, needle } => write!(f, "{key} ILIKE '%{needle}%'")?,
                AttrPredicate::IsSet { key } => write!(f, "{key} IS NOT NULL")?,
                AttrPredicate::IsUnset { key } => write!(f, "{key} IS NULL")?,
            }
        }
        if let Projection::GroupCount { key } = &self.projection {
            write!(f, " GROUP BY {key}")?;
        }
        if let Some(order) = &self.order_by {
            match &order.key {
                OrderKey::Attr(a) => write!(f, " ORDER BY {a}")?,
                OrderKey::Count => write!(f, " ORDER BY COUNT(*)")?,
            }
            if order.descending {
                f.write_str(" DESC")?;
            }
        }
        if let Some(n) = self.limit {
            write!(f, " LIMIT {n}")?;
        }
        Ok(())
    }
}

/// Tabular query output. Absent attribute values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

impl PathDB {
    /// Entity IDs matching the query's type and predicates.
    pub fn matching(&self, query: &PathQuery) -> RoaringBitmap {
        let Some(universe) = self.find_by_type(&query.type_name) else {
            return RoaringBitmap::new();
        };
        let mut ids = universe.clone();
        for predicate in &query.predicates {
            if ids.is_empty() {
                break;
            }
            ids &= predicate.eval(self, universe);
        }
        ids
    }

    /// Evaluate a query.
    ///
    /// Without an explicit order, attribute rows come back in insertion order
    /// and group rows by descending count, then value.
    pub fn execute(&self, query: &PathQuery) -> QueryRows {
        let ids = self.matching(query);

        let mut out = match &query.projection {
            Projection::Count => QueryRows {
                columns: vec!["count".to_string()],
                rows: vec![vec![ids.len().to_string()]],
            },
            Projection::Attrs(cols) => self.project_attrs(&ids, cols, query.order_by.as_ref()),
            Projection::GroupCount { key } => {
                self.project_groups(&ids, key, query.order_by.as_ref())
            }
        };

        if let Some(n) = query.limit {
            out.rows.truncate(n);
        }
        out
    }

    fn project_attrs(
        &self,
        ids: &RoaringBitmap,
        cols: &[String],
        order: Option<&OrderBy>,
    ) -> QueryRows {
        let columns: Vec<String> = if cols.is_empty() {
            let mut names = self.attr_names();
            if let Some(pos) = names.iter().position(|n| n == "id") {
                let id = names.remove(pos);
                names.insert(0, id);
            }
            names
        } else {
            cols.to_vec()
        };

        let mut entity_ids: Vec<u32> = ids.iter().collect();
        if let Some(OrderBy {
            key: OrderKey::Attr(attr),
            descending,
        }) = order
        {
            let keys: HashMap<u32, Option<String>> = entity_ids
                .iter()
                .map(|&id| (id, self.attr(id, attr)))
                .collect();
            entity_ids.sort_by(|a, b| {
                let ord = compare_values(keys[a].as_deref(), keys[b].as_deref());
                if *descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let rows = entity_ids
            .into_iter()
            .map(|id| {
                columns
                    .iter()
                    .map(|c| self.attr(id, c).unwrap_or_default())
                    .collect()
            })
            .collect();

        QueryRows { columns, rows }
    }

    fn project_groups(&self, ids: &RoaringBitmap, key: &str, order: Option<&OrderBy>) -> QueryRows {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for id in ids {
            *counts.entry(self.attr(id, key).unwrap_or_default()).or_insert(0) += 1;
        }
        let mut groups: Vec<(String, usize)> = counts.into_iter().collect();

        match order {
            Some(OrderBy {
                key: OrderKey::Attr(_),
                descending,
            }) => groups.sort_by(|a, b| {
                let ord = compare_values(Some(&a.0), Some(&b.0));
                if *descending {
                    ord.reverse()
                } else {
                    ord
                }
            }),
            Some(OrderBy {
                key: OrderKey::Count,
                descending: false,
            }) => groups.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0))),
            _ => groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))),
        }

        QueryRows {
            columns: vec![key.to_string(), "count".to_string()],
            rows: groups
                .into_iter()
                .map(|(value, n)| vec![value, n.to_string()])
                .collect(),
        }
    }
}

/// Numbers compare numerically, everything else lexically; absent sorts last.
fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
    }
}
