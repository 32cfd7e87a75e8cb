//! Plain-text rendering of query results.
//!
//! Output carries no color codes; the CLI decorates headers itself.

use crate::executor::{QueryResult, Statistics};
use crate::resolver::Intent;
use std::fmt::Write;

/// Render a result the way the explorer prints it: numbered lists for
/// geographic and family answers, a table for raw queries, a panel for
/// statistics.
pub fn render(result: &QueryResult, list_limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.summary.message);
    match (&result.intent, &result.summary.statistics) {
        (Intent::Statistics, Some(stats)) => render_statistics(&mut out, stats),
        (Intent::Raw, _) => render_table(&mut out, &result.columns, &result.rows, list_limit),
        _ => render_list(&mut out, &result.rows, list_limit),
    }
    out
}

fn render_list(out: &mut String, rows: &[Vec<String>], limit: usize) {
    for (i, row) in rows.iter().take(limit).enumerate() {
        let mut fields = row.iter().filter(|f| !f.is_empty());
        let Some(id) = fields.next() else { continue };
        let rest: Vec<&str> = fields.map(String::as_str).collect();
        if rest.is_empty() {
            let _ = writeln!(out, "{:>3}. {id}", i + 1);
        } else {
            let _ = writeln!(out, "{:>3}. {id} ({})", i + 1, rest.join(", "));
        }
    }
    truncated_note(out, rows.len(), limit);
}

fn render_table(out: &mut String, columns: &[String], rows: &[Vec<String>], limit: usize) {
    let shown = &rows[..rows.len().min(limit)];
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            shown
                .iter()
                .filter_map(|r| r.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let _ = writeln!(out, "{}", padded(columns.iter().map(String::as_str), &widths));
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in shown {
        let _ = writeln!(out, "{}", padded(row.iter().map(String::as_str), &widths));
    }
    truncated_note(out, rows.len(), limit);
}

fn padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter().copied())
        .map(|(v, w)| format!("{v:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

fn render_statistics(out: &mut String, stats: &Statistics) {
    let _ = writeln!(out, "\nLanguages by macroarea:");
    for (area, n) in &stats.by_macroarea {
        let _ = writeln!(out, "  {area:<15} {n:>6}");
    }

    if !stats.top_families.is_empty() {
        let _ = writeln!(out, "\nLargest families:");
        for (family, n) in &stats.top_families {
            let _ = writeln!(out, "  {family:<22} {n:>6}");
        }
    }

    if !stats.top_countries.is_empty() {
        let _ = writeln!(out, "\nCountries with the most languages:");
        for (country, n) in &stats.top_countries {
            let _ = writeln!(out, "  {country:<22} {n:>6}");
        }
    }

    let _ = writeln!(out, "\nData coverage ({} languages):", stats.total);
    for field in &stats.field_coverage {
        let _ = writeln!(
            out,
            "  {:<12} {:>6} ({:.1}%)",
            field.label, field.count, field.pct
        );
    }

    if let Some(build) = &stats.last_build {
        let _ = writeln!(
            out,
            "\nLast build {} ({}): {} of {} records written, {} skipped, {} failed",
            build.finished_at.format("%Y-%m-%d %H:%M UTC"),
            build.state,
            build.written,
            build.total,
            build.skipped,
            build.failed
        );
    }
    let _ = writeln!(out, "Coverage: {:.1}%", stats.coverage_pct);
}

fn truncated_note(out: &mut String, total: usize, limit: usize) {
    if total > limit {
        let _ = writeln!(out, "... (showing first {limit} of {total})");
    }
}
