//! # cvd — filter console for the COVID-19 case dashboard
//!
//! - `cvd check <QUERY>` — Validate a filter and show how it was read.
//! - `cvd filter <QUERY>` — Apply a filter to case records.
//! - `cvd syntax` — Print the query language reference.

mod config;
mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cvd_core::{CaseDataSet, CaseRecord};
use cvd_filter::{convert, FilterCondition, FilterEngine, FilterSyntaxError};

use config::Config;

/// Query COVID-19 case records with the dashboard's filter language.
#[derive(Parser)]
#[command(name = "cvd", version, about, long_about = None)]
struct Cli {
    /// Path to the config file.
    #[arg(long, global = true, default_value = "cvd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a filter without applying it.
    Check {
        query: String,

        /// Print the parsed condition (or the error) as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Apply a filter to case records. An empty query keeps everything.
    Filter {
        #[arg(default_value = "")]
        query: String,

        /// JSON array of case records (default: config, then built-in sample).
        #[arg(long)]
        records: Option<PathBuf>,

        /// Maximum rows to print.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Print parameters, comparators and error codes.
    Syntax,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Filter(#[from] FilterSyntaxError),

    #[error("Failed to read records from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid records file {path:?}: {source}")]
    Records {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cvd=info,cvd_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config);
    let engine = FilterEngine::new();

    let result = match cli.command {
        Commands::Check { query, json } => check(&engine, &query, json || config.display.json),
        Commands::Filter {
            query,
            records,
            limit,
            json,
        } => {
            let path = records.or(config.data.records);
            let limit = limit.unwrap_or(config.display.limit);
            filter(&engine, &query, path.as_deref(), limit, json || config.display.json)
        }
        Commands::Syntax => {
            print!("{}", render::syntax_manual(&engine));
            Ok(())
        }
    };

    if let Err(e) = result {
        match &e {
            CliError::Filter(err) => eprintln!("❌ {}", render::syntax_error(err)),
            other => eprintln!("❌ {}", other),
        }
        std::process::exit(1);
    }
}

/// Parse a submitted query, logging the outcome.
fn submit(engine: &FilterEngine, query: &str) -> Result<FilterCondition, FilterSyntaxError> {
    tracing::debug!("Submitted query '{}'", query);
    match engine.parse(query) {
        Ok(condition) => {
            tracing::debug!("Compiled '{}'", condition);
            Ok(condition)
        }
        Err(e) => {
            tracing::warn!("Rejected query '{}': {}", query, e);
            Err(e)
        }
    }
}

fn check(engine: &FilterEngine, query: &str, as_json: bool) -> Result<(), CliError> {
    let parsed = submit(engine, query);

    if as_json {
        let out = match &parsed {
            Ok(condition) => json!({ "valid": true, "condition": condition }),
            Err(err) => json!({ "valid": false, "error": err }),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        // The JSON already carries the error; only the exit status is left.
        if parsed.is_err() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let condition = parsed?;
    println!("✅ {}", condition);
    if let Some(tree) = condition.tree() {
        for (i, leaf) in tree.leaves().iter().enumerate() {
            println!(
                "   {}. {} {} {} ({})",
                i + 1,
                leaf.parameter().keyword(),
                leaf.comparator(),
                leaf.raw(),
                leaf.parameter().kind().describe()
            );
        }
    }
    Ok(())
}

fn filter(
    engine: &FilterEngine,
    query: &str,
    path: Option<&Path>,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let condition = submit(engine, query)?;
    let data = load_records(path)?;
    let kept = data.filter(convert::<CaseRecord>(&condition));
    tracing::info!("{} of {} records match '{}'", kept.len(), data.len(), condition);

    if as_json {
        let out = json!({
            "condition": condition,
            "total": data.len(),
            "matched": kept.len(),
            "totals": kept.totals(),
            "population": kept.population(),
            "daily": kept.daily_stats(),
            "records": kept.records().iter().take(limit).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", render::summary(&condition.to_string(), &data, &kept));
    println!();
    println!("{}", render::records_table(&kept, limit));
    if !kept.is_empty() {
        println!();
        println!("{}", render::daily_table(&kept.daily_stats()));
    }
    Ok(())
}

fn load_records(path: Option<&Path>) -> Result<CaseDataSet, CliError> {
    let Some(path) = path else {
        tracing::debug!("No records file configured, using the built-in sample");
        return Ok(CaseDataSet::sample());
    };

    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<CaseRecord> =
        serde_json::from_str(&content).map_err(|source| CliError::Records {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(CaseDataSet::new(records))
}
