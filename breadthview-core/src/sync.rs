//! Chart sync coordinator.
//!
//! Keeps any number of panes on the same logical window and the same
//! crosshair date. There is no master pane: a change reported by any pane is
//! applied to every other registered pane.
//!
//! Panes whose range already matches the target are left alone, so an echo
//! notification from a pane that was just updated propagates nothing and the
//! exchange terminates after one round.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::trace;

/// Ranges closer than this on both ends are treated as equal.
const RANGE_EPSILON: f64 = 1e-9;

/// Visible window in bar-index coordinates. 0 is the oldest loaded bar;
/// negative values lie before the loaded data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    pub fn width(&self) -> f64 {
        self.to - self.from
    }

    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            from: self.from + delta,
            to: self.to + delta,
        }
    }

    pub fn same_as(&self, other: &LogicalRange) -> bool {
        (self.from - other.from).abs() < RANGE_EPSILON && (self.to - other.to).abs() < RANGE_EPSILON
    }
}

/// The three dashboard panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaneId {
    Price,
    Breadth,
    HighLow,
}

impl PaneId {
    pub const ALL: [PaneId; 3] = [PaneId::Price, PaneId::Breadth, PaneId::HighLow];

    pub fn label(self) -> &'static str {
        match self {
            PaneId::Price => "Price",
            PaneId::Breadth => "Breadth",
            PaneId::HighLow => "New Highs - New Lows",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PaneId::Price => PaneId::Breadth,
            PaneId::Breadth => PaneId::HighLow,
            PaneId::HighLow => PaneId::Price,
        }
    }
}

/// What the coordinator needs from a rendered chart.
pub trait ChartHandle {
    fn visible_range(&self) -> Option<LogicalRange>;

    fn set_visible_range(&mut self, range: LogicalRange);

    /// Value of this pane's primary series at `date`, if it has a point there.
    fn point_at(&self, date: NaiveDate) -> Option<f64>;

    fn set_crosshair(&mut self, date: NaiveDate, value: f64);

    fn clear_crosshair(&mut self);
}

#[derive(Debug)]
pub struct ChartSyncCoordinator<H: ChartHandle> {
    panes: BTreeMap<PaneId, H>,
}

impl<H: ChartHandle> Default for ChartSyncCoordinator<H> {
    fn default() -> Self {
        Self {
            panes: BTreeMap::new(),
        }
    }
}

impl<H: ChartHandle> ChartSyncCoordinator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pane, returning the handle it replaced.
    pub fn register_pane(&mut self, id: PaneId, handle: H) -> Option<H> {
        self.panes.insert(id, handle)
    }

    pub fn unregister_pane(&mut self, id: PaneId) -> Option<H> {
        self.panes.remove(&id)
    }

    /// Drop every pane, as on an index switch.
    pub fn clear(&mut self) {
        self.panes.clear();
    }

    pub fn pane(&self, id: PaneId) -> Option<&H> {
        self.panes.get(&id)
    }

    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut H> {
        self.panes.get_mut(&id)
    }

    pub fn pane_ids(&self) -> impl Iterator<Item = PaneId> + '_ {
        self.panes.keys().copied()
    }

    pub fn panes_mut(&mut self) -> impl Iterator<Item = (PaneId, &mut H)> + '_ {
        self.panes.iter_mut().map(|(id, h)| (*id, h))
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    /// Apply `range` to every pane other than `source` that is not already
    /// showing it. Returns the number of panes updated.
    pub fn on_visible_range_changed(&mut self, source: PaneId, range: LogicalRange) -> usize {
        let mut updated = 0;
        for (id, pane) in self.panes.iter_mut() {
            if *id == source {
                continue;
            }
            if pane.visible_range().is_some_and(|r| r.same_as(&range)) {
                continue;
            }
            pane.set_visible_range(range);
            updated += 1;
        }
        trace!(?source, updated, from = range.from, to = range.to, "range synced");
        updated
    }

    /// Mirror a crosshair move. `None` means the source crosshair left the
    /// plot; every other pane clears its crosshair.
    pub fn on_crosshair_moved(&mut self, source: PaneId, date: Option<NaiveDate>) {
        for (id, pane) in self.panes.iter_mut() {
            if *id == source {
                continue;
            }
            match date.and_then(|d| pane.point_at(d).map(|v| (d, v))) {
                Some((d, value)) => pane.set_crosshair(d, value),
                None => pane.clear_crosshair(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeChart {
        range: Option<LogicalRange>,
        points: BTreeMap<NaiveDate, f64>,
        crosshair: Option<(NaiveDate, f64)>,
        set_calls: usize,
    }

    impl ChartHandle for FakeChart {
        fn visible_range(&self) -> Option<LogicalRange> {
            self.range
        }

        fn set_visible_range(&mut self, range: LogicalRange) {
            self.set_calls += 1;
            self.range = Some(range);
        }

        fn point_at(&self, date: NaiveDate) -> Option<f64> {
            self.points.get(&date).copied()
        }

        fn set_crosshair(&mut self, date: NaiveDate, value: f64) {
            self.crosshair = Some((date, value));
        }

        fn clear_crosshair(&mut self) {
            self.crosshair = None;
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn coordinator() -> ChartSyncCoordinator<FakeChart> {
        let mut c = ChartSyncCoordinator::new();
        for id in PaneId::ALL {
            c.register_pane(id, FakeChart::default());
        }
        c
    }

    #[test]
    fn range_change_reaches_all_other_panes() {
        let mut c = coordinator();
        let r = LogicalRange::new(10.0, 50.0);
        c.pane_mut(PaneId::Breadth).unwrap().range = Some(r);
        assert_eq!(c.on_visible_range_changed(PaneId::Breadth, r), 2);
        for id in PaneId::ALL {
            assert_eq!(c.pane(id).unwrap().range, Some(r));
        }
    }

    #[test]
    fn echo_is_a_noop() {
        let mut c = coordinator();
        let r = LogicalRange::new(-5.0, 20.0);
        c.pane_mut(PaneId::Price).unwrap().range = Some(r);
        c.on_visible_range_changed(PaneId::Price, r);
        // The breadth pane reports the range it was just given.
        assert_eq!(c.on_visible_range_changed(PaneId::Breadth, r), 0);
        assert_eq!(c.pane(PaneId::HighLow).unwrap().set_calls, 1);
    }

    #[test]
    fn crosshair_follows_date_or_clears() {
        let mut c = coordinator();
        c.pane_mut(PaneId::Breadth).unwrap().points.insert(d(3), 0.4);
        c.pane_mut(PaneId::HighLow).unwrap().crosshair = Some((d(2), 1.0));

        c.on_crosshair_moved(PaneId::Price, Some(d(3)));
        assert_eq!(c.pane(PaneId::Breadth).unwrap().crosshair, Some((d(3), 0.4)));
        assert_eq!(c.pane(PaneId::HighLow).unwrap().crosshair, None);
        assert_eq!(c.pane(PaneId::Price).unwrap().crosshair, None);

        c.on_crosshair_moved(PaneId::Price, None);
        assert_eq!(c.pane(PaneId::Breadth).unwrap().crosshair, None);
    }

    #[test]
    fn unregistered_pane_is_not_touched() {
        let mut c = coordinator();
        let removed = c.unregister_pane(PaneId::HighLow).unwrap();
        c.on_visible_range_changed(PaneId::Price, LogicalRange::new(0.0, 1.0));
        assert_eq!(removed.set_calls, 0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn pane_cycle_and_shift() {
        assert_eq!(PaneId::HighLow.next(), PaneId::Price);
        let r = LogicalRange::new(-2.0, 8.0).shifted(5.0);
        assert!(r.same_as(&LogicalRange::new(3.0, 13.0)));
        assert_eq!(r.width(), 10.0);
    }
}
