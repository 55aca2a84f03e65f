//! Fetched date ranges and their keys.

use super::bar::{Bar, Symbol};
use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive `[start, end]` date window identifying one API fetch.
///
/// Two fetches with the same key are the same batch; the store uses the key
/// to reject repeated backfills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RangeKey {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RangeKey {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The window loaded when an index is first selected: `[today - days, today]`.
    ///
    /// `None` when the start falls outside chrono's date range.
    pub fn trailing(today: NaiveDate, days: i64) -> Option<Self> {
        let start = today.checked_sub_signed(Duration::try_days(days)?)?;
        Some(Self { start, end: today })
    }

    /// The year immediately preceding `earliest_start`.
    ///
    /// `end = earliest_start - 1 day`, `start = end - 1 year`. Feb 29 clamps
    /// to Feb 28. Returns `None` only at the edge of chrono's date range.
    pub fn preceding_year(earliest_start: NaiveDate) -> Option<Self> {
        let end = earliest_start.pred_opt()?;
        let start = end.checked_sub_months(Months::new(12))?;
        Some(Self { start, end })
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// One successful API response: the index bars and every constituent's bars
/// for the requested window.
///
/// Immutable once created; the session keeps them in fetch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRange {
    pub key: RangeKey,
    pub index: Vec<Bar>,
    pub constituents: BTreeMap<Symbol, Vec<Bar>>,
}

impl FetchedRange {
    pub fn new(key: RangeKey, index: Vec<Bar>, constituents: BTreeMap<Symbol, Vec<Bar>>) -> Self {
        Self {
            key,
            index,
            constituents,
        }
    }

    /// Total number of bars across the index and all constituents.
    pub fn bar_count(&self) -> usize {
        self.index.len() + self.constituents.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn preceding_year_from_new_year() {
        let key = RangeKey::preceding_year(d("2024-01-01")).unwrap();
        assert_eq!(key.end, d("2023-12-31"));
        assert_eq!(key.start, d("2022-12-31"));
    }

    #[test]
    fn preceding_year_clamps_leap_day() {
        let key = RangeKey::preceding_year(d("2024-03-01")).unwrap();
        assert_eq!(key.end, d("2024-02-29"));
        assert_eq!(key.start, d("2023-02-28"));
    }

    #[test]
    fn trailing_window() {
        let key = RangeKey::trailing(d("2024-10-27"), 365).unwrap();
        assert_eq!(key.start, d("2023-10-28"));
        assert_eq!(key.end, d("2024-10-27"));
        assert!(key.is_ordered());
        assert!(key.contains(d("2024-01-15")));
        assert!(!key.contains(d("2023-10-27")));
    }

    #[test]
    fn trailing_window_out_of_range() {
        assert_eq!(RangeKey::trailing(d("2024-06-28"), 200_000_000), None);
        assert_eq!(RangeKey::trailing(d("2024-06-28"), i64::MAX), None);
    }

    #[test]
    fn display_uses_iso_dates() {
        let key = RangeKey::new(d("2024-01-01"), d("2024-01-05"));
        assert_eq!(key.to_string(), "2024-01-01..2024-01-05");
    }
}
