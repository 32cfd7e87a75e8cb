//! SQL-ish raw query surface compiled into a `PathQuery`.
//!
//! We use `sqlparser` to avoid hand-rolling SQL parsing. The supported subset
//! is what the store can evaluate directly:
//!
//! ```sql
//! SELECT family, COUNT(*)
//! FROM Language
//! WHERE macroarea = 'Africa' AND genus ILIKE '%bantoid%' AND iso_code IS NOT NULL
//! GROUP BY family
//! ORDER BY count DESC
//! LIMIT 10;
//! ```
//!
//! - `SELECT *`, `SELECT a, b`, `SELECT COUNT(*)`, `SELECT k, COUNT(*) ... GROUP BY k`
//! - `WHERE` is a conjunction of `=`, `LIKE`/`ILIKE` (`'v'` or `'%v%'`,
//!   both case-insensitive), `IS NULL`, `IS NOT NULL`
//! - one `ORDER BY` key: a column, `count` or `COUNT(*)`
//! - `LIMIT n`
//!
//! Columns may be qualified (`l.family`); only the last part is used. Only
//! `SELECT` statements are accepted, so a raw query can never write.

use crate::error::QueryError;
use sqlparser::ast::{
    BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr, GroupByExpr, Ident,
    OrderByExpr, Query, SelectItem, SetExpr, Statement, TableFactor, Value,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use walsgraph_pathdb::{AttrPredicate, OrderKey, PathQuery, Projection};
use walsgraph_storage::LANGUAGE_TYPE;

type Result<T> = std::result::Result<T, QueryError>;

fn unsupported(msg: impl Into<String>) -> QueryError {
    QueryError::Unsupported(msg.into())
}

/// Whether `input` is syntactically SQL, whatever the store makes of it.
pub fn is_sql(input: &str) -> bool {
    Parser::parse_sql(&GenericDialect {}, input).is_ok()
}

pub fn parse_sqlish_query(input: &str) -> Result<PathQuery> {
    let dialect = GenericDialect {};
    let mut statements =
        Parser::parse_sql(&dialect, input).map_err(|e| QueryError::Parse(e.to_string()))?;
    if statements.len() != 1 {
        return Err(unsupported(format!(
            "expected exactly one SQL statement, got {}",
            statements.len()
        )));
    }

    match statements.remove(0) {
        Statement::Query(q) => lower_query(&q),
        _ => Err(unsupported("only SELECT statements are accepted")),
    }
}

fn lower_query(query: &Query) -> Result<PathQuery> {
    if query.with.is_some() || query.offset.is_some() {
        return Err(unsupported("WITH and OFFSET are not supported"));
    }
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(unsupported("only plain SELECT queries are supported"));
    };
    if select.distinct.is_some() || select.having.is_some() {
        return Err(unsupported("DISTINCT and HAVING are not supported"));
    }

    // FROM
    let [table] = select.from.as_slice() else {
        return Err(unsupported("expected exactly one table in FROM"));
    };
    if !table.joins.is_empty() {
        return Err(unsupported("joins are not supported"));
    }
    let TableFactor::Table { name, .. } = &table.relation else {
        return Err(unsupported("FROM must name a table"));
    };
    let type_name = name.0.last().map(|i| i.value.clone()).unwrap_or_default();
    if !type_name.eq_ignore_ascii_case(LANGUAGE_TYPE) {
        return Err(unsupported(format!(
            "unknown table `{type_name}` (only `{LANGUAGE_TYPE}` exists)"
        )));
    }
    let mut out = PathQuery::new(LANGUAGE_TYPE);

    // SELECT + GROUP BY
    let group_key = match &select.group_by {
        GroupByExpr::Expressions(exprs) => match exprs.as_slice() {
            [] => None,
            [expr] => Some(column_name(expr)?),
            _ => return Err(unsupported("GROUP BY takes a single column")),
        },
        GroupByExpr::All => return Err(unsupported("GROUP BY ALL is not supported")),
    };
    out.projection = lower_projection(&select.projection, group_key.as_deref())?;

    // WHERE
    if let Some(selection) = &select.selection {
        collect_predicates(selection, &mut out.predicates)?;
    }

    // ORDER BY
    match query.order_by.as_slice() {
        [] => {}
        [order] => {
            let key = lower_order_key(order, &out.projection)?;
            out.order_by = Some(walsgraph_pathdb::OrderBy {
                key,
                descending: order.asc == Some(false),
            });
        }
        _ => return Err(unsupported("ORDER BY takes a single key")),
    }

    // LIMIT
    if let Some(limit) = &query.limit {
        out.limit = Some(expr_as_usize(limit)?);
    }

    Ok(out)
}

fn lower_projection(items: &[SelectItem], group_key: Option<&str>) -> Result<Projection> {
    let mut columns = Vec::new();
    let mut has_count = false;
    for item in items {
        let expr = match item {
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                if items.len() != 1 || group_key.is_some() {
                    return Err(unsupported("`*` must be the only SELECT item"));
                }
                return Ok(Projection::Attrs(Vec::new()));
            }
            SelectItem::UnnamedExpr(expr) => expr,
            SelectItem::ExprWithAlias { expr, .. } => expr,
        };
        if let Expr::Function(f) = expr {
            if is_count_star(f)? {
                has_count = true;
                continue;
            }
        }
        columns.push(column_name(expr)?);
    }

    match (group_key, has_count) {
        (None, false) => Ok(Projection::Attrs(columns)),
        (None, true) if columns.is_empty() => Ok(Projection::Count),
        (None, true) => Err(unsupported("mixing columns with COUNT(*) needs GROUP BY")),
        (Some(key), true) if columns == [key] => Ok(Projection::GroupCount {
            key: key.to_string(),
        }),
        (Some(key), _) => Err(unsupported(format!(
            "with GROUP BY {key} select exactly `{key}, COUNT(*)`"
        ))),
    }
}

fn is_count_star(f: &Function) -> Result<bool> {
    if !f.name.to_string().eq_ignore_ascii_case("count") {
        return Err(unsupported(format!("unsupported function `{}`", f.name)));
    }
    match f.args.as_slice() {
        [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)] => Ok(true),
        _ => Err(unsupported("only COUNT(*) is supported")),
    }
}

fn collect_predicates(expr: &Expr, out: &mut Vec<AttrPredicate>) -> Result<()> {
    match expr {
        Expr::Nested(inner) => collect_predicates(inner, out),
        Expr::BinaryOp { left, op, right } => match op {
            BinaryOperator::And => {
                collect_predicates(left, out)?;
                collect_predicates(right, out)
            }
            BinaryOperator::Eq => {
                // Accept both `col = 'v'` and `'v' = col`.
                let (key, value) = match (column_name(left), string_value(right)) {
                    (Ok(key), Ok(value)) => (key, value),
                    _ => (column_name(right)?, string_value(left)?),
                };
                out.push(AttrPredicate::Eq { key, value });
                Ok(())
            }
            other => Err(unsupported(format!("unsupported WHERE operator `{other}`"))),
        },
        Expr::Like {
            negated,
            expr,
            pattern,
            ..
        }
        | Expr::ILike {
            negated,
            expr,
            pattern,
            ..
        } => {
            if *negated {
                return Err(unsupported("NOT LIKE is not supported"));
            }
            out.push(lower_like(column_name(expr)?, &string_value(pattern)?)?);
            Ok(())
        }
        Expr::IsNull(inner) => {
            out.push(AttrPredicate::IsUnset {
                key: column_name(inner)?,
            });
            Ok(())
        }
        Expr::IsNotNull(inner) => {
            out.push(AttrPredicate::IsSet {
                key: column_name(inner)?,
            });
            Ok(())
        }
        other => Err(unsupported(format!("unsupported WHERE predicate `{other}`"))),
    }
}

fn lower_like(key: String, pattern: &str) -> Result<AttrPredicate> {
    let inner = pattern
        .strip_prefix('%')
        .and_then(|p| p.strip_suffix('%'))
        .unwrap_or(pattern);
    if inner.contains(['%', '_']) {
        return Err(unsupported(format!(
            "LIKE pattern `{pattern}` must be 'text' or '%text%'"
        )));
    }
    if inner.is_empty() {
        return Ok(AttrPredicate::IsSet { key });
    }
    Ok(AttrPredicate::Contains {
        key,
        needle: inner.to_string(),
    })
}

fn lower_order_key(order: &OrderByExpr, projection: &Projection) -> Result<OrderKey> {
    let is_count = match &order.expr {
        Expr::Function(f) => is_count_star(f)?,
        Expr::Identifier(id) => id.value.eq_ignore_ascii_case("count"),
        _ => false,
    };
    if is_count {
        return match projection {
            Projection::GroupCount { .. } => Ok(OrderKey::Count),
            _ => Err(unsupported("ORDER BY count needs GROUP BY")),
        };
    }
    Ok(OrderKey::Attr(column_name(&order.expr)?))
}

fn column_name(expr: &Expr) -> Result<String> {
    let ident: &Ident = match expr {
        Expr::Identifier(id) => id,
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .ok_or_else(|| unsupported("empty column name"))?,
        other => return Err(unsupported(format!("expected a column, got `{other}`"))),
    };
    let name = ident.value.trim();
    if name.is_empty() {
        return Err(unsupported("empty column name"));
    }
    Ok(name.to_string())
}

fn string_value(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Value(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Expr::Value(Value::DoubleQuotedString(s)) => Ok(s.clone()),
        Expr::Value(Value::Number(s, _)) => Ok(s.clone()),
        other => Err(unsupported(format!("expected a literal, got `{other}`"))),
    }
}

fn expr_as_usize(e: &Expr) -> Result<usize> {
    match e {
        Expr::Value(Value::Number(s, _)) => s
            .parse::<usize>()
            .map_err(|e| unsupported(format!("invalid LIMIT `{s}`: {e}"))),
        other => Err(unsupported(format!("unsupported LIMIT expression `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walsgraph_pathdb::OrderBy;

    #[test]
    fn select_columns_with_filters() -> Result<()> {
        let q = parse_sqlish_query(
            "SELECT l.id, l.family FROM Language AS l \
             WHERE l.country_id = 'ES' AND genus ILIKE '%romance%' AND iso_code IS NOT NULL \
             ORDER BY id LIMIT 10;",
        )?;
        assert_eq!(q.type_name, "Language");
        assert_eq!(q.projection, Projection::Attrs(vec!["id".into(), "family".into()]));
        assert_eq!(
            q.predicates,
            vec![
                AttrPredicate::eq("country_id", "ES"),
                AttrPredicate::contains("genus", "romance"),
                AttrPredicate::IsSet {
                    key: "iso_code".into()
                },
            ]
        );
        assert_eq!(
            q.order_by,
            Some(OrderBy {
                key: OrderKey::Attr("id".into()),
                descending: false
            })
        );
        assert_eq!(q.limit, Some(10));
        Ok(())
    }

    #[test]
    fn count_and_group_by() -> Result<()> {
        let q = parse_sqlish_query("select count(*) from language where macroarea = 'Africa'")?;
        assert_eq!(q.projection, Projection::Count);

        let q = parse_sqlish_query(
            "SELECT family, COUNT(*) FROM Language WHERE family IS NOT NULL \
             GROUP BY family ORDER BY COUNT(*) DESC LIMIT 8",
        )?;
        assert_eq!(
            q.projection,
            Projection::GroupCount {
                key: "family".into()
            }
        );
        assert_eq!(
            q.order_by,
            Some(OrderBy {
                key: OrderKey::Count,
                descending: true
            })
        );
        Ok(())
    }

    #[test]
    fn writes_are_rejected() {
        for sql in [
            "DELETE FROM Language",
            "DROP TABLE Language",
            "INSERT INTO Language (id) VALUES ('x')",
            "UPDATE Language SET family = 'x'",
        ] {
            assert!(
                matches!(parse_sqlish_query(sql), Err(QueryError::Unsupported(_))),
                "{sql}"
            );
        }
    }

    #[test]
    fn malformed_sql_is_a_parse_error() {
        assert!(matches!(
            parse_sqlish_query("SELEC id FROM"),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn unsupported_shapes_are_reported() {
        for sql in [
            "SELECT id FROM Country",
            "SELECT id FROM Language WHERE family = 'x' OR genus = 'y'",
            "SELECT id FROM Language WHERE family LIKE 'Indo%'",
            "SELECT id, COUNT(*) FROM Language",
            "SELECT MAX(id) FROM Language",
            "SELECT id FROM Language a JOIN Language b ON a.id = b.id",
        ] {
            assert!(
                matches!(parse_sqlish_query(sql), Err(QueryError::Unsupported(_))),
                "{sql}"
            );
        }
    }

    #[test]
    fn rendered_queries_parse_back() -> Result<()> {
        let q = PathQuery::new(LANGUAGE_TYPE)
            .filter(AttrPredicate::eq("country_id", "ES"))
            .filter(AttrPredicate::contains("family", "indo"))
            .select(Projection::Attrs(vec!["id".into()]))
            .order_by(OrderKey::Attr("id".into()), false)
            .limit(20);
        assert_eq!(parse_sqlish_query(&q.to_string())?, q);
        Ok(())
    }
}
