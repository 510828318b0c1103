//! Text output for the console: record tables, summaries and the syntax manual.

use std::fmt::Write;

use cvd_core::{CaseDataSet, CaseRecord, DailyCaseCounts};
use cvd_filter::{Comparator, FilterEngine, FilterSyntaxError, FilterSyntaxErrorReason};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "County")]
    county: String,
    #[tabled(rename = "Confirmed")]
    confirmed: u64,
    #[tabled(rename = "Fatal")]
    fatal: u64,
    #[tabled(rename = "Per 100K")]
    confirmed_per_100k: String,
    #[tabled(rename = "Death %")]
    death_rate: String,
}

impl From<&CaseRecord> for RecordRow {
    fn from(r: &CaseRecord) -> Self {
        Self {
            date: r.date.to_string(),
            state: r.state.abbr.clone(),
            county: r.county_name().unwrap_or("-").to_string(),
            confirmed: r.confirmed,
            fatal: r.fatal,
            confirmed_per_100k: rate(r.confirmed_per_100k),
            death_rate: rate(r.death_rate_percent),
        }
    }
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Confirmed")]
    confirmed: String,
    #[tabled(rename = "Fatal")]
    fatal: String,
    #[tabled(rename = "Per 100K")]
    confirmed_per_100k: String,
}

impl From<&DailyCaseCounts> for DailyRow {
    fn from(d: &DailyCaseCounts) -> Self {
        Self {
            date: d.date.to_string(),
            confirmed: format!("{} ({:+})", d.confirmed, d.confirmed_diff),
            fatal: format!("{} ({:+})", d.fatal, d.fatal_diff),
            confirmed_per_100k: rate(d.confirmed_per_100k),
        }
    }
}

#[derive(Tabled)]
struct ParameterRow {
    #[tabled(rename = "Parameter")]
    keywords: String,
    #[tabled(rename = "Value")]
    kind: String,
    #[tabled(rename = "Comparators")]
    comparators: String,
}

fn rate(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Up to `limit` records as a table, with a note when rows were cut.
pub fn records_table(data: &CaseDataSet, limit: usize) -> String {
    let rows: Vec<RecordRow> = data.records().iter().take(limit).map(RecordRow::from).collect();
    let mut out = Table::new(rows).with(Style::rounded()).to_string();
    if data.len() > limit {
        let _ = write!(out, "\n... {} more record(s) not shown", data.len() - limit);
    }
    out
}

pub fn daily_table(daily: &[DailyCaseCounts]) -> String {
    let rows: Vec<DailyRow> = daily.iter().map(DailyRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Counts, totals and population of a filter result.
pub fn summary(condition: &str, all: &CaseDataSet, kept: &CaseDataSet) -> String {
    let totals = kept.totals();
    let population = kept.population();
    let mut out = String::new();
    let _ = writeln!(out, "Condition:  {}", condition);
    let _ = writeln!(out, "Records:    {} of {}", kept.len(), all.len());
    let _ = writeln!(out, "Confirmed:  {}", totals.confirmed);
    let _ = writeln!(out, "Fatal:      {}", totals.fatal);
    let _ = write!(out, "Population: {}", population);
    out
}

/// A failed query: code, explanation and context.
pub fn syntax_error(err: &FilterSyntaxError) -> String {
    format!(
        "{}\n  {}\n  at {}",
        err.reason().code(),
        err.reason().describe(),
        err.context()
    )
}

/// The query language reference, generated from the engine's catalogs.
pub fn syntax_manual(engine: &FilterEngine) -> String {
    let rows: Vec<ParameterRow> = engine
        .parameters()
        .parameters()
        .map(|p| {
            let comparators: Vec<&str> = engine
                .comparators()
                .comparators()
                .filter(|c| !(p.kind().is_textual() && c.is_ordering()))
                .map(|c| c.symbol())
                .collect();
            ParameterRow {
                keywords: p.keywords().join(", "),
                kind: p.kind().describe().to_string(),
                comparators: comparators.join(" "),
            }
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Query:  PARAMETER COMPARATOR VALUE [(AND|OR) PARAMETER COMPARATOR VALUE]...");
    let _ = writeln!(out, "Terms combine left to right. Parentheses are not allowed.");
    let _ = writeln!(out, "Example: confirmed > 100 AND state = WI");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
    let _ = writeln!(
        out,
        "Comparators: {}",
        Comparator::ALL.iter().map(|c| c.symbol()).collect::<Vec<_>>().join(" ")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Errors:");
    for reason in FilterSyntaxErrorReason::ALL {
        let _ = writeln!(out, "  {:<28} {}", reason.code(), reason.describe());
    }
    out
}
