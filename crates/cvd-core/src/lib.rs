//! # cvd-core — case data for the COVID dashboard
//!
//! Records, counties and the aggregate statistics shown beside a filter
//! result. Everything here is plain data; the filter language lives in
//! `cvd-filter` and only consumes [`CaseRecord`]s.

pub mod dataset;
pub mod record;

pub use dataset::{CaseDataSet, CaseTotals, DailyCaseCounts};
pub use record::{CaseRecord, County, StateRef, RATE_BASE};
