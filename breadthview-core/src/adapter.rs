//! Chart adapter: turns merged bars and indicators into per-pane series.
//!
//! Every series in a `DashboardFrame` has one entry per index bar, so a
//! logical bar index means the same date in every pane. Missing values are
//! carried as `None` and rendered as gaps.

use crate::config::DashboardConfig;
use crate::domain::Bar;
use crate::indicators::IndicatorSeries;
use crate::store::MergedSeries;
use chrono::NaiveDate;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramPoint {
    pub value: f64,
    /// Turnover: close above open. High/low: net count above zero.
    pub rising: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaLine {
    pub period: usize,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricePane {
    pub candles: Vec<Option<Candle>>,
    pub turnover: Vec<HistogramPoint>,
    pub ma_lines: Vec<MaLine>,
}

/// Everything the three panes draw, aligned to `dates`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFrame {
    pub dates: Vec<NaiveDate>,
    /// Chart timestamps (unix seconds, display offset applied).
    pub times: Vec<i64>,
    pub price: PricePane,
    pub breadth: Vec<Option<f64>>,
    pub high_low: Vec<HistogramPoint>,
}

impl DashboardFrame {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn ma_line(&self, period: usize) -> Option<&MaLine> {
        self.price.ma_lines.iter().find(|l| l.period == period)
    }
}

#[derive(Debug, Clone)]
pub struct ChartAdapter {
    utc_offset_hours: i64,
}

impl Default for ChartAdapter {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ChartAdapter {
    pub fn new(utc_offset_hours: i64) -> Self {
        Self { utc_offset_hours }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.display_utc_offset_hours)
    }

    /// Unix seconds for midnight of `date`, shifted by the display offset.
    pub fn chart_time(&self, date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
            + self.utc_offset_hours * 3600
    }

    pub fn render(&self, merged: &MergedSeries, indicators: &IndicatorSeries) -> DashboardFrame {
        let n = merged.index.len();
        if indicators.len() != n {
            warn!(
                bars = n,
                indicators = indicators.len(),
                "indicator snapshot does not match merged series"
            );
        }

        let mut invalid = 0usize;
        let candles = merged
            .index
            .iter()
            .map(|bar| {
                if bar.is_sane() {
                    Some(candle(bar))
                } else {
                    invalid += 1;
                    None
                }
            })
            .collect();
        if invalid > 0 {
            warn!(invalid, "skipping invalid candles");
        }

        let turnover = merged
            .index
            .iter()
            .map(|bar| HistogramPoint {
                value: bar.turnover,
                rising: bar.is_up(),
            })
            .collect();

        let ma_lines = indicators
            .ma
            .iter()
            .map(|(&period, values)| MaLine {
                period,
                values: aligned(values, n),
            })
            .collect();

        let high_low = (0..n)
            .map(|i| {
                let net = indicators.net_high_low.get(i).copied().unwrap_or(0);
                HistogramPoint {
                    value: net as f64,
                    rising: net >= 0,
                }
            })
            .collect();

        DashboardFrame {
            dates: merged.index_dates(),
            times: merged.index.iter().map(|b| self.chart_time(b.date)).collect(),
            price: PricePane {
                candles,
                turnover,
                ma_lines,
            },
            breadth: aligned(&indicators.breadth, n),
            high_low,
        }
    }
}

fn candle(bar: &Bar) -> Candle {
    Candle {
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
    }
}

/// Pad or truncate to `n` so every pane series has one slot per bar.
fn aligned(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..n).map(|i| values.get(i).copied().flatten()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{compute, make_bars};
    use std::collections::BTreeMap;

    #[test]
    fn chart_time_applies_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(ChartAdapter::new(0).chart_time(date), 1_704_067_200);
        assert_eq!(ChartAdapter::default().chart_time(date), 1_704_067_200 + 8 * 3600);
    }

    #[test]
    fn render_aligns_panes() {
        let merged = MergedSeries {
            index: make_bars(&[100.0, 102.0, 101.0, 105.0, 107.0]),
            constituents: BTreeMap::new(),
        };
        let ind = compute(&merged, &[3]);
        let frame = ChartAdapter::default().render(&merged, &ind);

        assert_eq!(frame.len(), 5);
        assert_eq!(frame.price.candles.len(), 5);
        assert_eq!(frame.breadth, vec![None; 5]);
        let ma3 = frame.ma_line(3).unwrap();
        assert_eq!(ma3.values[1], None);
        assert_eq!(ma3.values[2], Some(101.0));
        assert!(frame.price.turnover[1].rising);
        assert!(!frame.price.turnover[2].rising);
        assert_eq!(frame.position(merged.index[4].date), Some(4));
    }

    #[test]
    fn insane_bar_becomes_gap() {
        let mut index = make_bars(&[100.0, 102.0]);
        index[1].high = 50.0;
        let merged = MergedSeries {
            index,
            constituents: BTreeMap::new(),
        };
        let frame = ChartAdapter::default().render(&merged, &compute(&merged, &[]));
        assert!(frame.price.candles[0].is_some());
        assert!(frame.price.candles[1].is_none());
        assert_eq!(frame.high_low.len(), 2);
    }
}
