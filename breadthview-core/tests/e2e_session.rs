//! End-to-end tests through `DashboardSession`.
//!
//! Tests:
//! 1. Five-bar scenario: MA(3) values and a one-year backfill
//! 2. Synthetic provider: initial fetch plus backfills, all panes aligned
//! 3. Recomputation is deterministic (same fingerprint on a fresh session)
//! 4. Index switch drops the in-flight response of the old index
//! 5. Debounced scroll triggers produce a single backfill request

use breadthview_core::adapter::ChartAdapter;
use breadthview_core::data::{RangeProvider, SyntheticProvider};
use breadthview_core::domain::{Bar, FetchedRange, RangeKey};
use breadthview_core::fingerprint::indicator_fingerprint;
use breadthview_core::indicators::IndicatorParams;
use breadthview_core::session::{DashboardSession, FetchKind, SessionEvent};
use breadthview_core::sync::LogicalRange;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn bar(date: NaiveDate, close: f64) -> Bar {
    Bar {
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        turnover: 1.0e6,
    }
}

fn five_bar_range() -> FetchedRange {
    let closes = [100.0, 102.0, 101.0, 105.0, 107.0];
    let index = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(d("2024-01-01") + chrono::Duration::days(i as i64), c))
        .collect();
    FetchedRange::new(
        RangeKey::new(d("2024-01-01"), d("2024-01-05")),
        index,
        BTreeMap::new(),
    )
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let v = actual.expect("value expected");
    assert!((v - expected).abs() < 0.01, "got {v}, expected {expected}");
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn five_bar_scenario_with_backfill() {
    let mut session = DashboardSession::new(IndicatorParams::with_ma_periods(&[3]), Duration::ZERO, 4);
    let initial = session.select_index("HK.800000", d("2024-01-05"));
    assert_eq!(initial.key, RangeKey::new(d("2024-01-01"), d("2024-01-05")));

    session.complete(initial, Ok(five_bar_range()));
    let ind = session.indicators();
    let ma = ind.ma(3).unwrap();
    assert_eq!(ma[0], None);
    assert_eq!(ma[1], None);
    assert_close(ma[2], 101.0);
    assert_close(ma[3], 102.67);
    assert_close(ma[4], 104.33);

    let backfill = session.request_backfill().unwrap();
    assert_eq!(backfill.kind, FetchKind::Backfill);
    assert_eq!(backfill.key, RangeKey::new(d("2022-12-31"), d("2023-12-31")));

    let older = FetchedRange::new(
        backfill.key,
        vec![bar(d("2023-12-28"), 98.0), bar(d("2023-12-29"), 99.0)],
        BTreeMap::new(),
    );
    let events = session.complete(backfill, Ok(older));
    assert!(matches!(
        events[0],
        SessionEvent::RangeMerged { prepended: 2, total_bars: 7, .. }
    ));

    let merged = session.merged();
    let tail: Vec<f64> = merged.index[2..].iter().map(|b| b.close).collect();
    assert_eq!(tail, vec![100.0, 102.0, 101.0, 105.0, 107.0]);
    assert!(merged.index.windows(2).all(|w| w[0].date < w[1].date));

    // MA(3) at 2024-01-01 is now defined from the backfilled bars.
    let ind = session.indicators();
    let pos = ind.position(d("2024-01-01")).unwrap();
    assert_eq!(pos, 2);
    assert_close(ind.ma(3).unwrap()[pos], (98.0 + 99.0 + 100.0) / 3.0);
    assert_close(ind.ma(3).unwrap()[pos + 4], 104.33);
}

#[test]
fn synthetic_session_with_backfills() {
    let provider = SyntheticProvider::new(12);
    let mut session = DashboardSession::default();
    let today = d("2024-06-28");

    let req = session.select_index("HK.800000", today);
    let events = session.complete(req.clone(), provider.fetch_range(&req.index, req.key));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::IndicatorsReady(_))));

    for _ in 0..2 {
        let req = session.request_backfill().unwrap();
        let result = provider.fetch_range(&req.index, req.key);
        session.complete(req, result);
    }
    assert_eq!(session.store().len(), 3);

    let merged = session.merged();
    let ind = session.indicators();
    assert_eq!(ind.len(), merged.len());
    assert!(merged.len() > 700);

    // Three years in, MA(200) and breadth are defined at the latest bar.
    let last = merged.len() - 1;
    assert!(ind.ma(200).unwrap()[last].is_some());
    assert!(ind.breadth[last].is_some());
    assert!(ind.breadth.iter().flatten().all(|v| v.abs() <= 1.0));

    let frame = ChartAdapter::default().render(&merged, &ind);
    assert_eq!(frame.len(), merged.len());
    assert_eq!(frame.breadth.len(), merged.len());
    assert_eq!(frame.high_low.len(), merged.len());
    assert_eq!(frame.price.ma_lines.len(), 5);
}

#[test]
fn recomputation_is_deterministic() {
    let provider = SyntheticProvider::new(8);
    let run = || {
        let mut session = DashboardSession::default();
        let req = session.select_index("HK.800700", d("2024-03-15"));
        let result = provider.fetch_range(&req.index, req.key);
        session.complete(req, result);
        let req = session.request_backfill().unwrap();
        let result = provider.fetch_range(&req.index, req.key);
        session.complete(req, result);
        indicator_fingerprint(&session.indicators())
    };
    assert_eq!(run(), run());
}

#[test]
fn index_switch_drops_old_response() {
    let provider = SyntheticProvider::new(4);
    let mut session = DashboardSession::default();
    let old = session.select_index("HK.800000", d("2024-06-28"));
    let new = session.select_index("HK.800700", d("2024-06-28"));

    let events = session.complete(old.clone(), provider.fetch_range(&old.index, old.key));
    assert!(matches!(events.as_slice(), [SessionEvent::StaleDropped(_)]));
    assert!(session.store().is_empty());

    session.complete(new.clone(), provider.fetch_range(&new.index, new.key));
    assert_eq!(session.index(), Some("HK.800700"));
    assert_eq!(session.store().len(), 1);
}

#[test]
fn debounced_scroll_requests_one_backfill() {
    let provider = SyntheticProvider::new(3);
    let mut session = DashboardSession::new(IndicatorParams::default(), Duration::from_millis(1000), 365);
    let req = session.select_index("HK.800000", d("2024-06-28"));
    session.complete(req.clone(), provider.fetch_range(&req.index, req.key));

    let t0 = Instant::now();
    let past_edge = LogicalRange::new(-10.0, 80.0);
    assert!(session.on_visible_range_changed(past_edge, t0));
    assert!(session.on_visible_range_changed(past_edge, t0 + Duration::from_millis(300)));
    assert!(session.poll(t0 + Duration::from_millis(900)).is_none());

    let fired = session.poll(t0 + Duration::from_millis(1400)).unwrap();
    assert!(session.poll(t0 + Duration::from_millis(3000)).is_none());

    // While in flight, further scrolling is ignored.
    assert!(!session.on_visible_range_changed(past_edge, t0 + Duration::from_millis(1500)));
    assert!(session.poll(t0 + Duration::from_millis(4000)).is_none());

    session.complete(fired.clone(), provider.fetch_range(&fired.index, fired.key));
    assert!(session.store().contains(fired.key));
}
