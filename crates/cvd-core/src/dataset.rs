//! # Case Data Set
//!
//! An in-memory collection of [`CaseRecord`]s plus the aggregate views the
//! dashboard shows next to a filter result: totals, population and
//! day-over-day case counts.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::record::{CaseRecord, County, StateRef, RATE_BASE};

/// Summed confirmed/fatal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaseTotals {
    pub confirmed: u64,
    pub fatal: u64,
}

/// Case counts for one date, with the change against the previous day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCaseCounts {
    pub date: NaiveDate,
    pub confirmed: u64,
    pub confirmed_diff: i64,
    pub fatal: u64,
    pub fatal_diff: i64,
    /// `None` when the set's population is unknown.
    pub confirmed_per_100k: Option<f64>,
    pub fatal_per_100k: Option<f64>,
}

/// `current - previous`, clamped to the `i64` range.
fn diff(current: u64, previous: u64) -> i64 {
    if current >= previous {
        i64::try_from(current - previous).unwrap_or(i64::MAX)
    } else {
        i64::try_from(previous - current).map_or(i64::MIN, |d| -d)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaseDataSet {
    records: Vec<CaseRecord>,
}

impl CaseDataSet {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }

    /// Keep only the records `predicate` accepts, preserving order.
    pub fn filter<P>(&self, predicate: P) -> CaseDataSet
    where
        P: Fn(&CaseRecord) -> bool,
    {
        let records: Vec<CaseRecord> = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();

        tracing::debug!(
            input = self.records.len(),
            kept = records.len(),
            "Filtered case data set"
        );

        CaseDataSet { records }
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct dates present in the set, ascending.
    pub fn sorted_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Total population over the distinct counties in the set.
    pub fn population(&self) -> u64 {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.county.as_ref().map(|c| (r.state.abbr.as_str(), c)))
            .filter(|(state, c)| seen.insert((*state, c.name.as_str())))
            .fold(0u64, |acc, (_, c)| acc.saturating_add(c.population))
    }

    pub fn totals(&self) -> CaseTotals {
        self.records
            .iter()
            .fold(CaseTotals::default(), |acc, r| CaseTotals {
                confirmed: acc.confirmed.saturating_add(r.confirmed),
                fatal: acc.fatal.saturating_add(r.fatal),
            })
    }

    /// Per-date sums, ascending by date. A date with no predecessor in the
    /// set diffs against zero.
    pub fn daily_stats(&self) -> Vec<DailyCaseCounts> {
        let mut by_date: BTreeMap<NaiveDate, CaseTotals> = BTreeMap::new();
        for r in &self.records {
            let entry = by_date.entry(r.date).or_default();
            entry.confirmed = entry.confirmed.saturating_add(r.confirmed);
            entry.fatal = entry.fatal.saturating_add(r.fatal);
        }

        let population = Some(self.population()).filter(|&p| p > 0);
        let per_100k = |count: u64| population.map(|p| count as f64 * RATE_BASE / p as f64);

        by_date
            .iter()
            .map(|(date, totals)| {
                let previous = date
                    .checked_sub_days(Days::new(1))
                    .and_then(|d| by_date.get(&d))
                    .copied()
                    .unwrap_or_default();

                DailyCaseCounts {
                    date: *date,
                    confirmed: totals.confirmed,
                    confirmed_diff: diff(totals.confirmed, previous.confirmed),
                    fatal: totals.fatal,
                    fatal_diff: diff(totals.fatal, previous.fatal),
                    confirmed_per_100k: per_100k(totals.confirmed),
                    fatal_per_100k: per_100k(totals.fatal),
                }
            })
            .collect()
    }

    /// Three days of Dane County, WI.
    pub fn sample() -> Self {
        let dane = County::new("Dane", 43.07, -89.4, 435_337, vec![53703, 53704, 53705]);
        let wi = StateRef::new("WI", Some("Wisconsin".to_string()));

        let records = [(17, 359, 17), (18, 360, 17), (19, 361, 19)]
            .into_iter()
            .filter_map(|(day, confirmed, fatal)| {
                NaiveDate::from_ymd_opt(2020, 4, day).map(|date| {
                    CaseRecord::new(date, wi.clone(), Some(dane.clone()), confirmed, fatal)
                })
            })
            .collect();

        Self::new(records)
    }
}

impl FromIterator<CaseRecord> for CaseDataSet {
    fn from_iter<I: IntoIterator<Item = CaseRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    fn county(name: &str, population: u64) -> County {
        County::new(name, 43.0, -89.0, population, vec![])
    }

    #[test]
    fn test_sample_has_three_days() {
        let set = CaseDataSet::sample();
        assert_eq!(set.len(), 3);
        assert_eq!(set.sorted_dates(), vec![date(17), date(18), date(19)]);
    }

    #[test]
    fn test_filter_preserves_order() {
        let set = CaseDataSet::sample();
        let kept = set.filter(|r| r.confirmed >= 360);
        let confirmed: Vec<u64> = kept.records().iter().map(|r| r.confirmed).collect();
        assert_eq!(confirmed, vec![360, 361]);
    }

    #[test]
    fn test_population_counts_each_county_once() {
        let wi = StateRef::new("WI", None);
        let set = CaseDataSet::new(vec![
            CaseRecord::new(date(1), wi.clone(), Some(county("Dane", 100)), 1, 0),
            CaseRecord::new(date(2), wi.clone(), Some(county("Dane", 100)), 2, 0),
            CaseRecord::new(date(1), wi.clone(), Some(county("Iowa", 50)), 1, 0),
            CaseRecord::new(date(1), wi, None, 1, 0),
        ]);
        assert_eq!(set.population(), 150);
    }

    #[test]
    fn test_same_county_name_in_two_states_is_distinct() {
        let set = CaseDataSet::new(vec![
            CaseRecord::new(date(1), StateRef::new("WI", None), Some(county("Adams", 10)), 1, 0),
            CaseRecord::new(date(1), StateRef::new("IL", None), Some(county("Adams", 20)), 1, 0),
        ]);
        assert_eq!(set.population(), 30);
    }

    #[test]
    fn test_daily_stats_diffs() {
        let stats = CaseDataSet::sample().daily_stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].confirmed_diff, 359);
        assert_eq!(stats[1].confirmed_diff, 1);
        assert_eq!(stats[2].fatal_diff, 2);
        assert!(stats[0].confirmed_per_100k.is_some());
    }

    #[test]
    fn test_totals_and_empty_set() {
        let set = CaseDataSet::sample();
        assert_eq!(
            set.totals(),
            CaseTotals {
                confirmed: 1080,
                fatal: 53
            }
        );

        let empty = CaseDataSet::default();
        assert!(empty.is_empty());
        assert!(empty.daily_stats().is_empty());
        assert_eq!(empty.population(), 0);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let wi = StateRef::new("WI", None);
        let set = CaseDataSet::new(vec![
            CaseRecord::new(date(1), wi.clone(), Some(county("Dane", 100)), u64::MAX, 0),
            CaseRecord::new(date(1), wi.clone(), Some(county("Dane", 100)), u64::MAX, 0),
            CaseRecord::new(date(2), wi, Some(county("Dane", 100)), 0, 0),
        ]);
        assert_eq!(set.totals().confirmed, u64::MAX);

        let stats = set.daily_stats();
        assert_eq!(stats[0].confirmed, u64::MAX);
        assert_eq!(stats[0].confirmed_diff, i64::MAX);
        assert_eq!(stats[1].confirmed_diff, i64::MIN);
    }

    #[test]
    fn test_diff_is_signed() {
        assert_eq!(diff(5, 3), 2);
        assert_eq!(diff(3, 5), -2);
        assert_eq!(diff(0, u64::MAX), i64::MIN);
    }
}
