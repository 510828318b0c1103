//! # Comparators
//!
//! The six relational operators of the filter language and their evaluation
//! over typed values.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::{FilterSyntaxError, FilterSyntaxErrorReason, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Self::Eq,
        Self::Neq,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// `true` for the comparators that need an ordered value type.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Neq)
    }

    /// Whether `ordering` (record value against query value) satisfies this
    /// comparator.
    #[inline]
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Neq => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }

    /// Compare totally ordered values: counts, zip codes, dates.
    #[inline]
    pub fn evaluate<T: Ord>(&self, record: &T, query: &T) -> bool {
        self.accepts(record.cmp(query))
    }

    /// Compare rates and coordinates. Values within `f64::EPSILON` are equal;
    /// a NaN on either side never matches.
    #[inline]
    pub fn evaluate_f64(&self, record: f64, query: f64) -> bool {
        if record.is_nan() || query.is_nan() {
            return false;
        }
        let ordering = if (record - query).abs() < f64::EPSILON {
            Ordering::Equal
        } else if record < query {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        self.accepts(ordering)
    }

    /// Case-insensitive text equality. Ordering comparators never match text;
    /// condition construction rejects them before evaluation is reached.
    #[inline]
    pub fn evaluate_text(&self, record: &str, query: &str) -> bool {
        match self {
            Self::Eq => record.to_lowercase() == query.to_lowercase(),
            Self::Neq => record.to_lowercase() != query.to_lowercase(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Symbol lookup over the fixed [`Comparator`] catalog.
#[derive(Debug, Clone)]
pub struct ComparatorSet {
    by_symbol: HashMap<&'static str, Comparator>,
}

impl ComparatorSet {
    pub fn new() -> Self {
        let by_symbol = Comparator::ALL.iter().map(|c| (c.symbol(), *c)).collect();
        Self { by_symbol }
    }

    pub fn resolve(&self, symbol: &str) -> Result<Comparator> {
        self.by_symbol.get(symbol).copied().ok_or_else(|| {
            FilterSyntaxError::new(
                FilterSyntaxErrorReason::UnknownComparator,
                format!("Comparator: {}", symbol),
            )
        })
    }

    pub fn comparators(&self) -> impl Iterator<Item = Comparator> {
        Comparator::ALL.into_iter()
    }
}

impl Default for ComparatorSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_all_symbols() {
        let set = ComparatorSet::new();
        for c in Comparator::ALL {
            assert_eq!(set.resolve(c.symbol()).unwrap(), c);
        }
    }

    #[test]
    fn test_resolve_unknown_symbol() {
        let err = ComparatorSet::new().resolve("=>").unwrap_err();
        assert_eq!(err.reason(), FilterSyntaxErrorReason::UnknownComparator);
        assert_eq!(err.context(), "Comparator: =>");
    }

    #[test]
    fn test_integer_evaluation() {
        assert!(Comparator::Gt.evaluate(&150u64, &100));
        assert!(!Comparator::Gt.evaluate(&100u64, &100));
        assert!(Comparator::Gte.evaluate(&100u64, &100));
        assert!(Comparator::Lt.evaluate(&50u64, &100));
        assert!(Comparator::Lte.evaluate(&100u64, &100));
        assert!(Comparator::Neq.evaluate(&1u64, &2));
        assert!(Comparator::Eq.evaluate(&2u64, &2));
    }

    #[test]
    fn test_float_evaluation_tolerates_rounding() {
        assert!(Comparator::Eq.evaluate_f64(0.1 + 0.2, 0.3));
        assert!(Comparator::Lte.evaluate_f64(0.1 + 0.2, 0.3));
        assert!(!Comparator::Gt.evaluate_f64(0.1 + 0.2, 0.3));
        assert!(!Comparator::Neq.evaluate_f64(f64::NAN, 1.0));
    }

    #[test]
    fn test_text_evaluation_ignores_case() {
        assert!(Comparator::Eq.evaluate_text("WI", "wi"));
        assert!(Comparator::Neq.evaluate_text("WI", "IL"));
        assert!(!Comparator::Gt.evaluate_text("b", "a"));
    }
}
