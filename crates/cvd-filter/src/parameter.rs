//! # Parameter Registry
//!
//! The filterable fields of a case record. Each [`Parameter`] knows the
//! keywords that name it in query text and how to cast a raw value into a
//! [`TypedValue`], rejecting text that breaks the field's domain rule.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{FilterSyntaxError, FilterSyntaxErrorReason as Reason, Result};

/// Accepted date spelling in queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound of a per-100K rate.
pub const CASE_RATE_MAX: f64 = 100_000.0;
/// Upper bound of a percentage.
pub const DEATH_RATE_MAX: f64 = 100.0;

pub const ZIP_CODE_MIN: u32 = 1;
pub const ZIP_CODE_MAX: u32 = 99_999;

pub const LATITUDE_LIMIT: f64 = 90.0;
pub const LONGITUDE_LIMIT: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Date,
    State,
    County,
    Confirmed,
    Fatal,
    ConfirmedPer100K,
    FatalPer100K,
    DeathRate,
    ZipCode,
    Latitude,
    Longitude,
}

/// What a parameter's value casts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Date,
    Text,
    /// Non-negative integer.
    CaseNumber,
    /// Non-negative rational, per 100K residents.
    CaseRate,
    /// Non-negative rational, percent.
    DeathRate,
    ZipCode,
    Latitude,
    Longitude,
}

impl ValueKind {
    /// Textual values only support equality comparators.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Date => "date (YYYY-MM-DD)",
            Self::Text => "text, case-insensitive",
            Self::CaseNumber => "non-negative integer",
            Self::CaseRate => "number in [0, 100000]",
            Self::DeathRate => "percent in [0, 100]",
            Self::ZipCode => "5-digit zip code",
            Self::Latitude => "number in [-90, 90]",
            Self::Longitude => "number in [-180, 180]",
        }
    }
}

/// A query value after a successful cast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Count(u64),
    Rate(f64),
    Zip(u32),
    Coordinate(f64),
    Date(NaiveDate),
    Text(String),
}

impl Parameter {
    pub const ALL: [Parameter; 11] = [
        Self::Date,
        Self::State,
        Self::County,
        Self::Confirmed,
        Self::Fatal,
        Self::ConfirmedPer100K,
        Self::FatalPer100K,
        Self::DeathRate,
        Self::ZipCode,
        Self::Latitude,
        Self::Longitude,
    ];

    /// Every accepted spelling; the first one is canonical.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["date"],
            Self::State => &["state"],
            Self::County => &["county"],
            Self::Confirmed => &["confirmed", "cases"],
            Self::Fatal => &["fatal", "deaths"],
            Self::ConfirmedPer100K => &["confirmed100k"],
            Self::FatalPer100K => &["fatal100k"],
            Self::DeathRate => &["deathrate"],
            Self::ZipCode => &["zip", "zipcode"],
            Self::Latitude => &["lat", "latitude"],
            Self::Longitude => &["lon", "lng", "longitude"],
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.keywords()[0]
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Date => ValueKind::Date,
            Self::State | Self::County => ValueKind::Text,
            Self::Confirmed | Self::Fatal => ValueKind::CaseNumber,
            Self::ConfirmedPer100K | Self::FatalPer100K => ValueKind::CaseRate,
            Self::DeathRate => ValueKind::DeathRate,
            Self::ZipCode => ValueKind::ZipCode,
            Self::Latitude => ValueKind::Latitude,
            Self::Longitude => ValueKind::Longitude,
        }
    }

    /// Cast raw query text into this parameter's value type.
    pub fn cast(&self, raw: &str) -> Result<TypedValue> {
        let text = raw.trim();
        let fail = |reason: Reason| {
            FilterSyntaxError::new(reason, format!("Parameter: {} ({})", self.keyword(), raw))
        };

        match self.kind() {
            ValueKind::Text => Ok(TypedValue::Text(text.to_string())),
            ValueKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(TypedValue::Date)
                .map_err(|_| fail(Reason::DateUnparsable)),
            ValueKind::CaseNumber => {
                let (negative, digits) =
                    split_integer(text).ok_or_else(|| fail(Reason::CaseNumberUncastable))?;
                if negative {
                    return Err(fail(Reason::CaseNumberNegative));
                }
                // Only a magnitude beyond u64 fails here.
                let n: u64 = digits
                    .parse()
                    .map_err(|_| fail(Reason::CaseNumberUncastable))?;
                Ok(TypedValue::Count(n))
            }
            ValueKind::CaseRate => {
                let rate = parse_finite(text).ok_or_else(|| fail(Reason::CaseRateUncastable))?;
                if rate < 0.0 {
                    return Err(fail(Reason::CaseRateNegative));
                }
                if rate > CASE_RATE_MAX {
                    return Err(fail(Reason::CaseRateInvalid));
                }
                Ok(TypedValue::Rate(rate))
            }
            ValueKind::DeathRate => {
                let rate = parse_finite(text).ok_or_else(|| fail(Reason::DeathRateUncastable))?;
                if rate < 0.0 {
                    return Err(fail(Reason::DeathRateNegative));
                }
                if rate > DEATH_RATE_MAX {
                    return Err(fail(Reason::DeathRateInvalid));
                }
                Ok(TypedValue::Rate(rate))
            }
            ValueKind::ZipCode => {
                let (negative, digits) =
                    split_integer(text).ok_or_else(|| fail(Reason::ZipCodeUncastable))?;
                let zip = digits
                    .parse::<u32>()
                    .ok()
                    .filter(|z| !negative && (ZIP_CODE_MIN..=ZIP_CODE_MAX).contains(z))
                    .ok_or_else(|| fail(Reason::ZipCodeInvalid))?;
                Ok(TypedValue::Zip(zip))
            }
            ValueKind::Latitude => {
                let lat = parse_finite(text).ok_or_else(|| fail(Reason::LatitudeUncastable))?;
                if !(-LATITUDE_LIMIT..=LATITUDE_LIMIT).contains(&lat) {
                    return Err(fail(Reason::LatitudeOverRange));
                }
                Ok(TypedValue::Coordinate(lat))
            }
            ValueKind::Longitude => {
                let lon = parse_finite(text).ok_or_else(|| fail(Reason::LongitudeUncastable))?;
                if !(-LONGITUDE_LIMIT..=LONGITUDE_LIMIT).contains(&lon) {
                    return Err(fail(Reason::LongitudeOverRange));
                }
                Ok(TypedValue::Coordinate(lon))
            }
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Split integer text into its sign and ASCII digits, with no bound on the
/// number of digits. `-0` counts as non-negative.
fn split_integer(text: &str) -> Option<(bool, &str)> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((negative && digits.bytes().any(|b| b != b'0'), digits))
}

// `f64::from_str` accepts "NaN" and "inf"; neither is a usable bound.
fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Keyword lookup over the fixed [`Parameter`] catalog.
///
/// Built once and shared read-only by every parser that borrows it.
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    by_keyword: HashMap<&'static str, Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        let by_keyword = Parameter::ALL
            .iter()
            .flat_map(|p| p.keywords().iter().map(move |kw| (*kw, *p)))
            .collect();
        Self { by_keyword }
    }

    /// Resolve a keyword, ignoring ASCII case.
    pub fn resolve(&self, keyword: &str) -> Result<Parameter> {
        self.by_keyword
            .get(keyword.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| {
                FilterSyntaxError::new(
                    Reason::UnknownParameter,
                    format!("Parameter: {}", keyword),
                )
            })
    }

    pub fn cast(&self, parameter: Parameter, raw: &str) -> Result<TypedValue> {
        parameter.cast(raw)
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> {
        Parameter::ALL.into_iter()
    }
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
