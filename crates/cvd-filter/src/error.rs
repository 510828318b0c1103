//! # Filter Syntax Errors
//!
//! One closed, flat set of reasons covers every way a query can be rejected,
//! whether the grammar or a value cast failed. A rejected query produces
//! exactly one [`FilterSyntaxError`]: the first failure found.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterSyntaxErrorReason {
    ParenthesesNotAllowed,
    IncompleteExpression,
    UnknownParameter,
    UnknownComparator,
    UnsupportedComparator,

    CaseNumberUncastable,
    CaseNumberNegative,

    CaseRateUncastable,
    CaseRateNegative,
    CaseRateInvalid,

    DeathRateUncastable,
    DeathRateNegative,
    DeathRateInvalid,

    ZipCodeUncastable,
    ZipCodeInvalid,

    LatitudeUncastable,
    LatitudeOverRange,

    LongitudeUncastable,
    LongitudeOverRange,

    DateUnparsable,
}

impl FilterSyntaxErrorReason {
    pub const ALL: [FilterSyntaxErrorReason; 20] = [
        Self::ParenthesesNotAllowed,
        Self::IncompleteExpression,
        Self::UnknownParameter,
        Self::UnknownComparator,
        Self::UnsupportedComparator,
        Self::CaseNumberUncastable,
        Self::CaseNumberNegative,
        Self::CaseRateUncastable,
        Self::CaseRateNegative,
        Self::CaseRateInvalid,
        Self::DeathRateUncastable,
        Self::DeathRateNegative,
        Self::DeathRateInvalid,
        Self::ZipCodeUncastable,
        Self::ZipCodeInvalid,
        Self::LatitudeUncastable,
        Self::LatitudeOverRange,
        Self::LongitudeUncastable,
        Self::LongitudeOverRange,
        Self::DateUnparsable,
    ];

    /// The reason's stable name, e.g. `CASE_NUMBER_NEGATIVE`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParenthesesNotAllowed => "PARENTHESES_NOT_ALLOWED",
            Self::IncompleteExpression => "INCOMPLETE_EXPRESSION",
            Self::UnknownParameter => "UNKNOWN_PARAMETER",
            Self::UnknownComparator => "UNKNOWN_COMPARATOR",
            Self::UnsupportedComparator => "UNSUPPORTED_COMPARATOR",
            Self::CaseNumberUncastable => "CASE_NUMBER_UNCASTABLE",
            Self::CaseNumberNegative => "CASE_NUMBER_NEGATIVE",
            Self::CaseRateUncastable => "CASE_RATE_UNCASTABLE",
            Self::CaseRateNegative => "CASE_RATE_NEGATIVE",
            Self::CaseRateInvalid => "CASE_RATE_INVALID",
            Self::DeathRateUncastable => "DEATH_RATE_UNCASTABLE",
            Self::DeathRateNegative => "DEATH_RATE_NEGATIVE",
            Self::DeathRateInvalid => "DEATH_RATE_INVALID",
            Self::ZipCodeUncastable => "ZIP_CODE_UNCASTABLE",
            Self::ZipCodeInvalid => "ZIP_CODE_INVALID",
            Self::LatitudeUncastable => "LATITUDE_UNCASTABLE",
            Self::LatitudeOverRange => "LATITUDE_OVER_RANGE",
            Self::LongitudeUncastable => "LONGITUDE_UNCASTABLE",
            Self::LongitudeOverRange => "LONGITUDE_OVER_RANGE",
            Self::DateUnparsable => "DATE_UNPARSABLE",
        }
    }

    /// Human-readable explanation shown next to the code.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::ParenthesesNotAllowed => "Parentheses are not allowed in a filter",
            Self::IncompleteExpression => {
                "Every condition needs a parameter, a comparator and a value"
            }
            Self::UnknownParameter => "Unknown parameter",
            Self::UnknownComparator => "Unknown comparator",
            Self::UnsupportedComparator => "Comparator not supported for this parameter",
            Self::CaseNumberUncastable => "Case count must be an integer",
            Self::CaseNumberNegative => "Case count cannot be negative",
            Self::CaseRateUncastable => "Case rate must be a number",
            Self::CaseRateNegative => "Case rate cannot be negative",
            Self::CaseRateInvalid => "Case rate cannot exceed 100000 per 100K residents",
            Self::DeathRateUncastable => "Death rate must be a number",
            Self::DeathRateNegative => "Death rate cannot be negative",
            Self::DeathRateInvalid => "Death rate cannot exceed 100 percent",
            Self::ZipCodeUncastable => "Zip code must be an integer",
            Self::ZipCodeInvalid => "Zip code must be within 00001-99999",
            Self::LatitudeUncastable => "Latitude must be a number",
            Self::LatitudeOverRange => "Latitude must be within [-90, 90]",
            Self::LongitudeUncastable => "Longitude must be a number",
            Self::LongitudeOverRange => "Longitude must be within [-180, 180]",
            Self::DateUnparsable => "Date must be written as YYYY-MM-DD",
        }
    }
}

impl std::fmt::Display for FilterSyntaxErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected query: the reason plus the offending token, parameter or value.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{reason}: {context}")]
pub struct FilterSyntaxError {
    pub reason: FilterSyntaxErrorReason,
    pub context: String,
}

impl FilterSyntaxError {
    pub fn new(reason: FilterSyntaxErrorReason, context: impl Into<String>) -> Self {
        Self {
            reason,
            context: context.into(),
        }
    }

    pub fn reason(&self) -> FilterSyntaxErrorReason {
        self.reason
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

pub type Result<T> = std::result::Result<T, FilterSyntaxError>;
