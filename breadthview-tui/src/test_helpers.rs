//! Test helpers for building app state without a terminal or worker thread.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use breadthview_core::adapter::{ChartAdapter, DashboardFrame};
use breadthview_core::config::DashboardConfig;
use breadthview_core::data::RangeProvider;
use breadthview_core::domain::Bar;
use breadthview_core::indicators::IndicatorEngine;
use breadthview_core::store::MergedSeries;
use chrono::{Duration, NaiveDate};

use crate::app::AppState;
use crate::worker::{WorkerCommand, WorkerResponse};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

/// App wired to plain channels; the test plays the worker.
pub fn test_app(require_email: bool) -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
    let config = DashboardConfig {
        require_email,
        backfill_debounce_ms: 0,
        ..DashboardConfig::default()
    };
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    (AppState::new(config, cmd_tx, resp_rx, today()), cmd_rx, resp_tx)
}

/// Run every queued range fetch through `provider` and feed the results back.
pub fn complete_pending(app: &mut AppState, cmd_rx: &Receiver<WorkerCommand>, provider: &dyn RangeProvider) {
    while let Ok(cmd) = cmd_rx.try_recv() {
        if let WorkerCommand::FetchRange { request } = cmd {
            let result = provider.fetch_range(&request.index, request.key);
            app.handle_worker_response(WorkerResponse::RangeFetched { request, result });
        }
    }
}

/// Frame over daily closes starting 2024-01-01, index only.
pub fn frame_of(closes: &[f64]) -> DashboardFrame {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let index: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: start + Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            turnover: 1000.0,
        })
        .collect();
    let merged = MergedSeries {
        index,
        constituents: BTreeMap::new(),
    };
    let indicators = IndicatorEngine::default().compute(&merged);
    ChartAdapter::default().render(&merged, &indicators)
}
