//! Indicator engine.
//!
//! Pure functions over a `MergedSeries`: moving averages of the index close,
//! the breadth ratio, and 52-week new-high/new-low counts. Every output is
//! aligned by position to `series.index` and is recomputed from scratch
//! whenever the merged series changes.
//!
//! Cross-series access is always by date. Constituent windows (MA for
//! breadth, trailing extremes) run over each symbol's own samples.

pub mod breadth;
pub mod high_low;
pub mod sma;

use crate::store::MergedSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use breadth::breadth;
pub use high_low::{high_low_counts, HighLowCounts};
pub use sma::sma;

/// Default overlays on the price pane.
pub const DEFAULT_MA_PERIODS: [usize; 5] = [5, 10, 20, 50, 200];
/// 52 weeks of 5 trading days.
pub const DEFAULT_HIGH_LOW_WINDOW: usize = 52 * 5;
pub const DEFAULT_BREADTH_PERIOD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ma_periods: Vec<usize>,
    pub breadth_period: usize,
    pub high_low_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_periods: DEFAULT_MA_PERIODS.to_vec(),
            breadth_period: DEFAULT_BREADTH_PERIOD,
            high_low_window: DEFAULT_HIGH_LOW_WINDOW,
        }
    }
}

impl IndicatorParams {
    pub fn with_ma_periods(periods: &[usize]) -> Self {
        Self {
            ma_periods: periods.to_vec(),
            ..Self::default()
        }
    }

    /// Reject zero periods and windows.
    pub fn validate(&self) -> Result<(), String> {
        if self.ma_periods.iter().any(|&p| p == 0) {
            return Err("moving average periods must be >= 1".into());
        }
        if self.breadth_period == 0 {
            return Err("breadth period must be >= 1".into());
        }
        if self.high_low_window == 0 {
            return Err("high/low window must be >= 1".into());
        }
        Ok(())
    }
}

/// Indicator snapshot aligned by position to the merged index series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSeries {
    pub dates: Vec<NaiveDate>,
    /// Moving averages of the index close, keyed by period.
    pub ma: BTreeMap<usize, Vec<Option<f64>>>,
    pub breadth: Vec<Option<f64>>,
    pub new_highs: Vec<u32>,
    pub new_lows: Vec<u32>,
    pub net_high_low: Vec<i64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn ma(&self, period: usize) -> Option<&[Option<f64>]> {
        self.ma.get(&period).map(Vec::as_slice)
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

/// Computes an `IndicatorSeries` for a fixed parameter set.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn compute(&self, series: &MergedSeries) -> IndicatorSeries {
        let closes: Vec<f64> = series.index.iter().map(|b| b.close).collect();

        let mut ma = BTreeMap::new();
        for &period in &self.params.ma_periods {
            ma.insert(period, sma(&closes, period));
        }

        let breadth = breadth(series, self.params.breadth_period);
        let counts = high_low_counts(series, self.params.high_low_window);

        debug!(
            bars = closes.len(),
            symbols = series.constituents.len(),
            "indicators recomputed"
        );

        IndicatorSeries {
            dates: series.index_dates(),
            ma,
            breadth,
            new_highs: counts.new_highs,
            new_lows: counts.new_lows,
            net_high_low: counts.net,
        }
    }
}

/// Compute indicators with the given MA periods and default breadth and
/// high/low parameters.
pub fn compute(series: &MergedSeries, periods: &[usize]) -> IndicatorSeries {
    IndicatorEngine::new(IndicatorParams::with_ma_periods(periods)).compute(series)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, turnover = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    make_bars_from(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        0,
        closes,
    )
}

/// Like `make_bars`, but starting `offset` calendar days after `base`.
#[cfg(test)]
pub fn make_bars_from(
    base: chrono::NaiveDate,
    offset: usize,
    closes: &[f64],
) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base + chrono::Duration::days((offset + i) as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                turnover: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
