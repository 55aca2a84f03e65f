//! Range store: accumulates fetched ranges and merges them into one ordered
//! series per symbol.
//!
//! Every merge rebuilds the merged view from all stored ranges in fetch order,
//! so a bar fetched later replaces an earlier bar with the same date. The
//! resulting `MergedSeries` is an immutable snapshot shared through `Arc`.

use crate::domain::{Bar, FetchedRange, RangeKey, Symbol};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("malformed range {key}: {reason}")]
    MalformedRange { key: RangeKey, reason: String },
}

/// The merged view of every fetched range.
///
/// Each series is strictly ascending by date. Index and constituent lengths
/// are independent; constituents may have gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSeries {
    pub index: Vec<Bar>,
    pub constituents: BTreeMap<Symbol, Vec<Bar>>,
}

impl MergedSeries {
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().map(|b| b.date)
    }

    /// Position of `date` in the index series.
    pub fn index_position(&self, date: NaiveDate) -> Option<usize> {
        position_of(&self.index, date)
    }

    /// A constituent's bar on `date`, if it traded that day.
    pub fn constituent_bar(&self, symbol: &str, date: NaiveDate) -> Option<&Bar> {
        let bars = self.constituents.get(symbol)?;
        position_of(bars, date).map(|i| &bars[i])
    }

    pub fn index_dates(&self) -> Vec<NaiveDate> {
        self.index.iter().map(|b| b.date).collect()
    }
}

/// Binary search for `date` in an ascending bar series.
pub fn position_of(bars: &[Bar], date: NaiveDate) -> Option<usize> {
    bars.binary_search_by_key(&date, |b| b.date).ok()
}

/// Session history of fetched ranges plus the current merged snapshot.
#[derive(Debug, Default)]
pub struct RangeStore {
    ranges: Vec<FetchedRange>,
    snapshot: Arc<MergedSeries>,
}

impl RangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fetched range and rebuild the merged snapshot.
    ///
    /// A range whose key is already stored is a no-op and returns the current
    /// snapshot. A rejected range leaves the store untouched.
    pub fn merge(&mut self, range: FetchedRange) -> Result<Arc<MergedSeries>, StoreError> {
        if self.contains(range.key) {
            debug!(range = %range.key, "range already stored, skipping merge");
            return Ok(Arc::clone(&self.snapshot));
        }
        validate(&range)?;

        self.ranges.push(range);
        self.snapshot = Arc::new(rebuild(&self.ranges));
        debug!(
            ranges = self.ranges.len(),
            index_bars = self.snapshot.index.len(),
            symbols = self.snapshot.constituents.len(),
            "merged range"
        );
        Ok(Arc::clone(&self.snapshot))
    }

    pub fn contains(&self, key: RangeKey) -> bool {
        self.ranges.iter().any(|r| r.key == key)
    }

    /// Start date of the earliest stored range.
    pub fn earliest_start(&self) -> Option<NaiveDate> {
        self.ranges.iter().map(|r| r.key.start).min()
    }

    /// Stored ranges in fetch order.
    pub fn ranges(&self) -> &[FetchedRange] {
        &self.ranges
    }

    pub fn snapshot(&self) -> Arc<MergedSeries> {
        Arc::clone(&self.snapshot)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.snapshot = Arc::new(MergedSeries::default());
    }
}

fn validate(range: &FetchedRange) -> Result<(), StoreError> {
    let reject = |reason: String| StoreError::MalformedRange {
        key: range.key,
        reason,
    };
    if !range.key.is_ordered() {
        return Err(reject("start date after end date".into()));
    }
    if let Some(bar) = range.index.iter().find(|b| b.is_void()) {
        return Err(reject(format!("non-finite index prices on {}", bar.date)));
    }
    Ok(())
}

/// Sort-and-dedup over every stored range, last-fetched wins.
fn rebuild(ranges: &[FetchedRange]) -> MergedSeries {
    let mut index: BTreeMap<NaiveDate, &Bar> = BTreeMap::new();
    let mut constituents: BTreeMap<&str, BTreeMap<NaiveDate, &Bar>> = BTreeMap::new();
    let mut void_bars = 0usize;

    for range in ranges {
        for bar in &range.index {
            index.insert(bar.date, bar);
        }
        for (symbol, bars) in &range.constituents {
            let series = constituents.entry(symbol.as_str()).or_default();
            for bar in bars {
                if bar.is_void() {
                    void_bars += 1;
                    continue;
                }
                series.insert(bar.date, bar);
            }
        }
    }

    if void_bars > 0 {
        warn!(void_bars, "skipped constituent bars with non-finite prices");
    }

    MergedSeries {
        index: index.into_values().cloned().collect(),
        constituents: constituents
            .into_iter()
            .map(|(sym, series)| (sym.to_string(), series.into_values().cloned().collect()))
            .collect(),
    }
}
