//! walsgraph CLI
//!
//! - `build`: rebuild the language graph from a WALS `languages.csv`
//! - `ask` / `raw` / `stats`: query the graph
//! - `schema`: describe the stored node shape and raw query surface
//! - `explore`: interactive menu and question loop

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use walsgraph_ingest::{BuildReport, BuildState};
use walsgraph_query::{run_query, run_raw_query, QueryExecutor, ResolvedQuery};
use walsgraph_storage::{attr, SnapshotStore, StoreConfig, LANGUAGE_TYPE};

mod config;
mod explore;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "walsgraph")]
#[command(author, version, about = "WALS language knowledge graph")]
struct Cli {
    /// JSON config file (store, build and query sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Graph store file (overrides config and WALSGRAPH_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the store and rebuild it from a WALS languages.csv
    Build {
        /// CLDF languages table
        dataset: PathBuf,
        /// Records per write batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Print the build report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a natural-language question
    Ask {
        question: String,
        #[arg(long)]
        json: bool,
    },

    /// Run a raw SELECT against the store (trusted input)
    Raw {
        query: String,
        #[arg(long)]
        json: bool,
    },

    /// Show graph statistics and data coverage
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Describe stored attributes and the raw query surface
    Schema,

    /// Interactive explorer
    Explore,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env(|k| std::env::var(k).ok())?;
    let batch_size = match &cli.command {
        Commands::Build { batch_size, .. } => *batch_size,
        _ => None,
    };
    config.apply_flags(cli.store.clone(), batch_size);

    match cli.command {
        Commands::Build { dataset, json, .. } => cmd_build(&config, &dataset, json),
        Commands::Ask { question, json } => {
            let store = open_existing(&config.store)?;
            let result = run_query(&store, &question, &config.query)?;
            emit(&result, json, config.query.list_limit)
        }
        Commands::Raw { query, json } => {
            let store = open_existing(&config.store)?;
            let result = run_raw_query(&store, &query, &config.query)?;
            emit(&result, json, config.query.list_limit)
        }
        Commands::Stats { json } => {
            let store = open_existing(&config.store)?;
            let result = QueryExecutor::new(&store, config.query.clone())
                .execute(&ResolvedQuery::Statistics)?;
            emit(&result, json, config.query.list_limit)
        }
        Commands::Schema => {
            cmd_schema();
            Ok(())
        }
        Commands::Explore => {
            let store = open_existing(&config.store)?;
            let mut input = explore::default_source()?;
            explore::run_explorer(&store, &config.query, input.as_mut())
        }
    }
}

/// Logs go to stderr so stdout only carries results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Open a store for reading; querying a store that was never built is an error.
fn open_existing(store: &StoreConfig) -> Result<SnapshotStore> {
    tracing::debug!(path = %store.path.display(), "opening store");
    let config = StoreConfig {
        create_if_missing: false,
        ..store.clone()
    };
    SnapshotStore::open(&config).with_context(|| {
        format!(
            "cannot open store {} (run `walsgraph build <languages.csv>` first)",
            store.path.display()
        )
    })
}

fn cmd_build(config: &AppConfig, dataset: &std::path::Path, json: bool) -> Result<()> {
    eprintln!(
        "{} {} -> {}",
        "Building".green().bold(),
        dataset.display(),
        config.store.path.display()
    );
    let report = walsgraph_ingest::run_build_at(&config.store, dataset, &config.build)
        .with_context(|| format!("build from {} failed", dataset.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    let state = match report.state {
        BuildState::Completed if report.failed == 0 => report.state.to_string().green().bold(),
        BuildState::Completed => report.state.to_string().yellow().bold(),
        _ => report.state.to_string().red().bold(),
    };
    println!("{state} run {}", report.run_id);
    println!("  records             {:>7}", report.total);
    println!("  written             {:>7}", report.written);
    println!("  skipped (invalid)   {:>7}", report.skipped);
    println!("  failed (store)      {:>7}", report.failed);
    println!("  unresolved country  {:>7}", report.unresolved_geography);
    println!("  coordinates dropped {:>7}", report.coordinates_dropped);
    println!("  duplicate ids       {:>7}", report.duplicate_ids);
    println!("  coverage            {:>6.1}%", report.coverage_pct());
    for chunk in &report.failed_chunks {
        println!(
            "  {} chunk {} ({} records, {} attempts): {}",
            "failed".red(),
            chunk.index,
            chunk.records,
            chunk.attempts,
            chunk.error
        );
    }
}

fn emit(result: &walsgraph_query::QueryResult, json: bool, list_limit: usize) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        explore::print_result(result, list_limit);
    }
    Ok(())
}

fn cmd_schema() {
    const DESCRIPTIONS: [(&str, &str); 11] = [
        (attr::ID, "language name (WALS code when the name is empty); unique key"),
        (attr::FAMILY, "language family, e.g. Indo-European"),
        (attr::GENUS, "genus, e.g. Romance"),
        (attr::SUBFAMILY, "subfamily, when recorded"),
        (attr::COUNTRY_ID, "primary ISO 3166-1 alpha-2 country code"),
        (attr::COUNTRIES, "all resolved country codes, space separated"),
        (attr::MACROAREA, "Africa, Eurasia, Australia, North America, South America or Papunesia"),
        (attr::LATITUDE, "decimal degrees, -90..90"),
        (attr::LONGITUDE, "decimal degrees, -180..180"),
        (attr::ISO_CODE, "ISO 639-3 code"),
        (attr::WALS_CODE, "WALS short code"),
    ];

    println!("{} {}", "Node type".green().bold(), LANGUAGE_TYPE.bold());
    for (name, description) in DESCRIPTIONS {
        println!("  {:<11} {}", name.cyan(), description);
    }
    println!();
    println!("{}", "Raw queries".green().bold());
    println!("  SELECT <cols | * | COUNT(*) | col, COUNT(*)> FROM {LANGUAGE_TYPE}");
    println!("    [WHERE col = 'v' | col LIKE '%v%' | col ILIKE '%v%' | col IS [NOT] NULL, joined by AND]");
    println!("    [GROUP BY col] [ORDER BY col|count [ASC|DESC]] [LIMIT n]");
    println!();
    println!("{}", "Example questions".green().bold());
    for q in explore::EXAMPLE_QUESTIONS {
        println!("  {q}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_store_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["walsgraph", "ask", "languages in Spain", "--store", "x.wgdb"])
            .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("x.wgdb")));
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn open_existing_refuses_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("absent.wgdb"),
            ..StoreConfig::default()
        };
        assert!(open_existing(&config).is_err());
    }
}
