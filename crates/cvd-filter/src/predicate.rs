//! # Predicate Converter
//!
//! Compiles a [`ConditionTree`] into a boxed decision function over records.
//! Compiling is pure; records are only touched when the returned function is
//! called. AND/OR short-circuit left to right.

use chrono::NaiveDate;
use cvd_core::CaseRecord;

use crate::comparator::Comparator;
use crate::condition::{ConditionEntity, ConditionTree, FilterCondition, LogicalOp};
use crate::parameter::{Parameter, TypedValue};

/// A compiled filter. Free of side effects and safe to share across threads.
pub type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// A record field as seen by a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Count(u64),
    Rate(f64),
    Coordinate(f64),
    Date(NaiveDate),
    ZipCodes(&'a [u32]),
    /// Text that matches under its name or an optional alias
    /// (a state's abbreviation and its full name).
    Text {
        name: &'a str,
        alias: Option<&'a str>,
    },
}

/// Anything a filter can be applied to.
pub trait Record {
    /// The record's value for `parameter`, or `None` when it is unknown.
    /// An unknown field fails every condition on it.
    fn field(&self, parameter: Parameter) -> Option<FieldValue<'_>>;
}

impl Record for CaseRecord {
    fn field(&self, parameter: Parameter) -> Option<FieldValue<'_>> {
        match parameter {
            Parameter::Date => Some(FieldValue::Date(self.date)),
            Parameter::State => Some(FieldValue::Text {
                name: &self.state.abbr,
                alias: self.state.name.as_deref(),
            }),
            Parameter::County => self
                .county_name()
                .map(|name| FieldValue::Text { name, alias: None }),
            Parameter::Confirmed => Some(FieldValue::Count(self.confirmed)),
            Parameter::Fatal => Some(FieldValue::Count(self.fatal)),
            Parameter::ConfirmedPer100K => self.confirmed_per_100k.map(FieldValue::Rate),
            Parameter::FatalPer100K => self.fatal_per_100k.map(FieldValue::Rate),
            Parameter::DeathRate => self.death_rate_percent.map(FieldValue::Rate),
            Parameter::ZipCode => {
                Some(self.zip_codes()).filter(|zips| !zips.is_empty()).map(FieldValue::ZipCodes)
            }
            Parameter::Latitude => self.latitude().map(FieldValue::Coordinate),
            Parameter::Longitude => self.longitude().map(FieldValue::Coordinate),
        }
    }
}

/// Compile a tree into a decision function.
pub fn compile<R>(tree: &ConditionTree) -> Predicate<R>
where
    R: Record + ?Sized + 'static,
{
    match tree {
        ConditionTree::Leaf(entity) => {
            let entity = entity.clone();
            Box::new(move |record: &R| {
                record
                    .field(entity.parameter())
                    .is_some_and(|field| holds(&entity, field))
            })
        }
        ConditionTree::Node { left, op, right } => {
            let left = compile::<R>(left);
            let right = compile::<R>(right);
            match op {
                LogicalOp::And => Box::new(move |record: &R| left(record) && right(record)),
                LogicalOp::Or => Box::new(move |record: &R| left(record) || right(record)),
            }
        }
    }
}

/// Compile a submitted query; the empty condition accepts every record.
pub fn convert<R>(condition: &FilterCondition) -> Predicate<R>
where
    R: Record + ?Sized + 'static,
{
    match condition.tree() {
        Some(tree) => compile(tree),
        None => Box::new(|_: &R| true),
    }
}

/// Whether `field` satisfies `entity`. Mismatched kinds never hold.
fn holds(entity: &ConditionEntity, field: FieldValue<'_>) -> bool {
    let cmp = entity.comparator();
    match (field, entity.value()) {
        (FieldValue::Count(r), TypedValue::Count(q)) => cmp.evaluate(&r, q),
        (FieldValue::Rate(r), TypedValue::Rate(q)) => cmp.evaluate_f64(r, *q),
        (FieldValue::Coordinate(r), TypedValue::Coordinate(q)) => cmp.evaluate_f64(r, *q),
        (FieldValue::Date(r), TypedValue::Date(q)) => cmp.evaluate(&r, q),
        (FieldValue::ZipCodes(zips), TypedValue::Zip(q)) => match cmp {
            Comparator::Neq => !zips.contains(q),
            _ => zips.iter().any(|z| cmp.evaluate(z, q)),
        },
        (FieldValue::Text { name, alias }, TypedValue::Text(q)) => {
            let matches = Comparator::Eq.evaluate_text(name, q)
                || alias.is_some_and(|a| Comparator::Eq.evaluate_text(a, q));
            match cmp {
                Comparator::Eq => matches,
                Comparator::Neq => !matches,
                _ => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::ComparatorSet;
    use crate::parameter::ParameterRegistry;
    use crate::parser::Parser;
    use cvd_core::{County, StateRef};
    use std::cell::Cell;
    use std::rc::Rc;

    fn record(state: &str, confirmed: u64, fatal: u64) -> CaseRecord {
        let county = County::new("Dane", 43.07, -89.4, 100_000, vec![53703, 53704]);
        CaseRecord::new(
            NaiveDate::from_ymd_opt(2020, 4, 17).unwrap(),
            StateRef::new(state, (state == "WI").then(|| "Wisconsin".to_string())),
            Some(county),
            confirmed,
            fatal,
        )
    }

    fn predicate(query: &str) -> Predicate<CaseRecord> {
        let parameters = ParameterRegistry::new();
        let comparators = ComparatorSet::new();
        let condition = Parser::new(&parameters, &comparators)
            .parse_condition(query)
            .unwrap();
        convert(&condition)
    }

    #[test]
    fn test_single_leaf() {
        let p = predicate("confirmed > 100");
        assert!(p(&record("WI", 150, 0)));
        assert!(!p(&record("WI", 50, 0)));
    }

    #[test]
    fn test_and_requires_both() {
        let p = predicate("confirmed > 100 AND state = WI");
        assert!(p(&record("WI", 150, 0)));
        assert!(!p(&record("IL", 150, 0)));
        assert!(!p(&record("WI", 50, 0)));
    }

    #[test]
    fn test_or_accepts_either() {
        let p = predicate("confirmed > 100 OR state = WI");
        assert!(p(&record("IL", 150, 0)));
        assert!(p(&record("WI", 50, 0)));
        assert!(!p(&record("IL", 50, 0)));
    }

    #[test]
    fn test_positional_evaluation() {
        // (confirmed > 100 AND fatal > 10) OR state = WI
        let p = predicate("confirmed > 100 AND fatal > 10 OR state = WI");
        assert!(p(&record("WI", 0, 0)));
        assert!(p(&record("IL", 150, 20)));
        assert!(!p(&record("IL", 150, 0)));

        // (state = WI OR confirmed > 100) AND fatal > 10
        let p = predicate("state = WI OR confirmed > 100 AND fatal > 10");
        assert!(!p(&record("WI", 0, 0)));
        assert!(p(&record("WI", 0, 11)));
    }

    #[test]
    fn test_state_matches_abbreviation_or_name() {
        assert!(predicate("state = wisconsin")(&record("WI", 1, 0)));
        assert!(predicate("state = wi")(&record("WI", 1, 0)));
        assert!(!predicate("state != Wisconsin")(&record("WI", 1, 0)));
        assert!(predicate("state != IL")(&record("WI", 1, 0)));
    }

    #[test]
    fn test_derived_fields() {
        // 400 confirmed over 100_000 residents.
        let r = record("WI", 400, 20);
        assert!(predicate("confirmed100k = 400")(&r));
        assert!(predicate("fatal100k < 20.5")(&r));
        assert!(predicate("deathrate >= 5")(&r));
        assert!(!predicate("deathrate > 5")(&r));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let r = CaseRecord::new(
            NaiveDate::from_ymd_opt(2020, 4, 17).unwrap(),
            StateRef::new("WI", None),
            None,
            0,
            0,
        );
        assert!(!predicate("deathrate < 100")(&r));
        assert!(!predicate("county != Dane")(&r));
        assert!(!predicate("lat > -90")(&r));
        assert!(!predicate("zip != 12345")(&r));
    }

    #[test]
    fn test_zip_and_coordinates() {
        let r = record("WI", 1, 0);
        assert!(predicate("zip = 53704")(&r));
        assert!(!predicate("zip != 53704")(&r));
        assert!(predicate("zip != 10001")(&r));
        assert!(predicate("zip > 53703")(&r));
        assert!(predicate("lat > 43 AND lon < -89")(&r));
    }

    #[test]
    fn test_dates() {
        let r = record("WI", 1, 0);
        assert!(predicate("date = 2020-04-17")(&r));
        assert!(predicate("date > 2020-04-01")(&r));
        assert!(!predicate("date < 2020-04-17")(&r));
    }

    #[test]
    fn test_empty_condition_accepts_everything() {
        let p: Predicate<CaseRecord> = convert(&FilterCondition::none());
        assert!(p(&record("IL", 0, 0)));
    }

    struct Counting {
        reads: Rc<Cell<usize>>,
        confirmed: u64,
        fatal: u64,
    }

    impl Record for Counting {
        fn field(&self, parameter: Parameter) -> Option<FieldValue<'_>> {
            self.reads.set(self.reads.get() + 1);
            match parameter {
                Parameter::Confirmed => Some(FieldValue::Count(self.confirmed)),
                Parameter::Fatal => Some(FieldValue::Count(self.fatal)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        let parameters = ParameterRegistry::new();
        let comparators = ComparatorSet::new();
        let parser = Parser::new(&parameters, &comparators);

        let and = compile::<Counting>(&parser.parse("confirmed > 100 AND fatal > 0").unwrap());
        let or = compile::<Counting>(&parser.parse("confirmed > 100 OR fatal > 0").unwrap());

        let reads = Rc::new(Cell::new(0));
        let low = Counting {
            reads: reads.clone(),
            confirmed: 5,
            fatal: 0,
        };
        let high = Counting {
            reads: reads.clone(),
            confirmed: 500,
            fatal: 0,
        };

        assert!(!and(&low));
        assert_eq!(reads.get(), 1);

        reads.set(0);
        assert!(or(&high));
        assert_eq!(reads.get(), 1);

        reads.set(0);
        assert!(!or(&low));
        assert_eq!(reads.get(), 2);
    }
}
