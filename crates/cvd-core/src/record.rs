//! # Case Records
//!
//! One row of the case-data table: a (date, state, county) observation with
//! cumulative confirmed/fatal counts. Derived rates are computed once, when
//! the record is built, so filtering never recomputes them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rates are expressed per this many residents.
pub const RATE_BASE: f64 = 100_000.0;

/// A county and the reference data attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct County {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    #[serde(default)]
    pub zip_codes: Vec<u32>,
}

impl County {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        population: u64,
        zip_codes: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            population,
            zip_codes,
        }
    }
}

/// The state a record belongs to. `abbr` is the two-letter code (`WI`),
/// `name` the full name when known (`Wisconsin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub abbr: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl StateRef {
    pub fn new(abbr: impl Into<String>, name: Option<String>) -> Self {
        Self {
            abbr: abbr.into(),
            name,
        }
    }
}

/// Wire shape of a record; derived fields are filled in by [`CaseRecord::new`].
#[derive(Debug, Clone, Deserialize)]
struct RawCaseRecord {
    date: NaiveDate,
    state: StateRef,
    #[serde(default)]
    county: Option<County>,
    confirmed: u64,
    fatal: u64,
}

/// A filterable case-data record.
///
/// `confirmed_per_100k`/`fatal_per_100k` are `None` when the county (and so
/// the population) is unknown; `death_rate_percent` is `None` when there are
/// no confirmed cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCaseRecord")]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub state: StateRef,
    pub county: Option<County>,
    pub confirmed: u64,
    pub fatal: u64,
    pub confirmed_per_100k: Option<f64>,
    pub fatal_per_100k: Option<f64>,
    pub death_rate_percent: Option<f64>,
}

impl CaseRecord {
    pub fn new(
        date: NaiveDate,
        state: StateRef,
        county: Option<County>,
        confirmed: u64,
        fatal: u64,
    ) -> Self {
        let population = county.as_ref().map(|c| c.population).filter(|&p| p > 0);
        let per_100k = |count: u64| population.map(|p| count as f64 * RATE_BASE / p as f64);
        let death_rate_percent = if confirmed > 0 {
            Some(fatal as f64 * 100.0 / confirmed as f64)
        } else {
            None
        };

        Self {
            date,
            confirmed_per_100k: per_100k(confirmed),
            fatal_per_100k: per_100k(fatal),
            death_rate_percent,
            state,
            county,
            confirmed,
            fatal,
        }
    }

    pub fn county_name(&self) -> Option<&str> {
        self.county.as_ref().map(|c| c.name.as_str())
    }

    pub fn latitude(&self) -> Option<f64> {
        self.county.as_ref().map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.county.as_ref().map(|c| c.longitude)
    }

    /// Zip codes of the record's county (empty when the county is unknown).
    pub fn zip_codes(&self) -> &[u32] {
        self.county
            .as_ref()
            .map(|c| c.zip_codes.as_slice())
            .unwrap_or(&[])
    }
}

impl From<RawCaseRecord> for CaseRecord {
    fn from(raw: RawCaseRecord) -> Self {
        Self::new(raw.date, raw.state, raw.county, raw.confirmed, raw.fatal)
    }
}
