//! Pane bindings: the chart-side state the sync coordinator drives.
//!
//! A binding owns one pane's visible window and crosshair, plus the pane's
//! primary series (close, breadth or net high/low) so the coordinator can
//! place a mirrored crosshair on it.

use breadthview_core::adapter::DashboardFrame;
use breadthview_core::sync::{ChartHandle, LogicalRange, PaneId};
use chrono::NaiveDate;
use std::ops::Range;

/// Bars shown when a pane first displays data.
pub const DEFAULT_VISIBLE_BARS: f64 = 120.0;

/// Narrowest window `zoom` allows.
pub const MIN_VISIBLE_BARS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct PaneBinding {
    id: PaneId,
    range: Option<LogicalRange>,
    crosshair: Option<(NaiveDate, f64)>,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl PaneBinding {
    pub fn new(id: PaneId) -> Self {
        Self {
            id,
            range: None,
            crosshair: None,
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    /// Reload the primary series from a freshly rendered frame.
    pub fn load(&mut self, frame: &DashboardFrame) {
        self.dates = frame.dates.clone();
        self.values = match self.id {
            PaneId::Price => frame
                .price
                .candles
                .iter()
                .map(|c| c.map(|c| c.close))
                .collect(),
            PaneId::Breadth => frame.breadth.clone(),
            PaneId::HighLow => frame.high_low.iter().map(|p| Some(p.value)).collect(),
        };
    }

    /// Keep the same dates in view after `bars` were prepended.
    pub fn shift(&mut self, bars: usize) {
        if bars == 0 {
            return;
        }
        if let Some(range) = self.range {
            self.range = Some(range.shifted(bars as f64));
        }
    }

    pub fn crosshair(&self) -> Option<(NaiveDate, f64)> {
        self.crosshair
    }

    /// Integer bar positions covered by the visible window, clamped to the
    /// loaded data.
    pub fn visible_bars(&self) -> Range<usize> {
        let len = self.dates.len();
        let Some(range) = self.range else {
            return 0..len;
        };
        let start = range.from.ceil().max(0.0) as usize;
        let end = (range.to.floor() + 1.0).max(0.0) as usize;
        start.min(len)..end.min(len)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl ChartHandle for PaneBinding {
    fn visible_range(&self) -> Option<LogicalRange> {
        self.range
    }

    fn set_visible_range(&mut self, range: LogicalRange) {
        self.range = Some(range);
    }

    fn point_at(&self, date: NaiveDate) -> Option<f64> {
        let pos = self.dates.binary_search(&date).ok()?;
        self.values.get(pos).copied().flatten()
    }

    fn set_crosshair(&mut self, date: NaiveDate, value: f64) {
        self.crosshair = Some((date, value));
    }

    fn clear_crosshair(&mut self) {
        self.crosshair = None;
    }
}

/// Window showing the most recent `DEFAULT_VISIBLE_BARS` of `len` bars, with
/// a small right margin.
pub fn initial_range(len: usize) -> LogicalRange {
    let to = len as f64 + 2.0;
    LogicalRange::new(to - DEFAULT_VISIBLE_BARS, to)
}

/// `range` scaled by `factor` around its right edge.
pub fn zoomed(range: LogicalRange, factor: f64, max_width: f64) -> LogicalRange {
    let width = (range.width() * factor).clamp(MIN_VISIBLE_BARS, max_width.max(MIN_VISIBLE_BARS));
    LogicalRange::new(range.to - width, range.to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::frame_of;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn point_at_reads_primary_series() {
        let frame = frame_of(&[10.0, 11.0, 12.0]);
        let mut price = PaneBinding::new(PaneId::Price);
        price.load(&frame);
        assert_eq!(price.point_at(d("2024-01-02")), Some(11.0));
        assert_eq!(price.point_at(d("2023-12-31")), None);

        let mut breadth = PaneBinding::new(PaneId::Breadth);
        breadth.load(&frame);
        assert_eq!(breadth.point_at(d("2024-01-01")), None);
    }

    #[test]
    fn shift_keeps_dates_in_view() {
        let mut pane = PaneBinding::new(PaneId::Breadth);
        pane.set_visible_range(LogicalRange::new(0.0, 50.0));
        pane.shift(250);
        assert_eq!(pane.visible_range(), Some(LogicalRange::new(250.0, 300.0)));
        pane.shift(0);
        assert_eq!(pane.visible_range(), Some(LogicalRange::new(250.0, 300.0)));
    }

    #[test]
    fn visible_bars_clamped_to_data() {
        let mut pane = PaneBinding::new(PaneId::Price);
        pane.load(&frame_of(&[1.0; 20]));
        assert_eq!(pane.visible_bars(), 0..20);

        pane.set_visible_range(LogicalRange::new(-5.5, 7.2));
        assert_eq!(pane.visible_bars(), 0..8);

        pane.set_visible_range(LogicalRange::new(15.0, 40.0));
        assert_eq!(pane.visible_bars(), 15..20);

        pane.set_visible_range(LogicalRange::new(-30.0, -10.0));
        assert!(pane.visible_bars().is_empty());
    }

    #[test]
    fn zoom_respects_bounds() {
        let range = LogicalRange::new(100.0, 200.0);
        let narrow = zoomed(range, 0.05, 500.0);
        assert_eq!(narrow.width(), MIN_VISIBLE_BARS);
        assert_eq!(narrow.to, 200.0);

        let wide = zoomed(range, 10.0, 300.0);
        assert_eq!(wide.width(), 300.0);
    }

    #[test]
    fn initial_range_ends_at_latest_bar() {
        let range = initial_range(250);
        assert!(range.to > 249.0);
        assert_eq!(range.width(), DEFAULT_VISIBLE_BARS);
    }
}
