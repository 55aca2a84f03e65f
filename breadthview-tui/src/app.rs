//! Application state. Single-owner, main-thread only.
//!
//! All UI state lives here. The worker thread communicates via channels and
//! every session mutation happens on this thread.

use std::collections::{BTreeSet, VecDeque};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use breadthview_core::adapter::{ChartAdapter, DashboardFrame};
use breadthview_core::config::DashboardConfig;
use breadthview_core::data::{validate_email, DataError, StockEntry};
use breadthview_core::indicators::IndicatorSeries;
use breadthview_core::session::{DashboardSession, FetchKind, FetchRequest, SessionEvent};
use breadthview_core::sync::{ChartHandle, ChartSyncCoordinator, LogicalRange, PaneId};

use crate::panes::{self, PaneBinding};
use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which full-screen view is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Gate,
    Loading,
    Error(String),
    Dashboard,
}

/// Which overlay (if any) is shown on top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    StockList,
    ErrorHistory,
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Input,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Input => "INPUT",
        }
    }

    fn of(error: &DataError) -> Self {
        match error {
            DataError::NetworkUnreachable(_) | DataError::Http { .. } => ErrorCategory::Network,
            DataError::InvalidRequest(_) => ErrorCategory::Input,
            DataError::Malformed(_) | DataError::Other(_) => ErrorCategory::Data,
        }
    }
}

/// Email gate form.
#[derive(Debug, Clone, Default)]
pub struct GateState {
    pub input: String,
    pub error: Option<String>,
    pub submitting: bool,
}

/// Drill-down list of constituents above their MA50 on one date.
#[derive(Debug, Clone)]
pub struct StockListState {
    pub index: String,
    pub date: NaiveDate,
    pub entries: Vec<StockEntry>,
    pub loading: bool,
    pub error: Option<String>,
    pub scroll: usize,
}

/// Values under the crosshair, shown in the price pane header.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub turnover: f64,
    pub ma: Vec<(usize, Option<f64>)>,
    pub breadth: Option<f64>,
    pub net_high_low: i64,
}

/// Top-level application state.
pub struct AppState {
    pub running: bool,
    pub screen: Screen,
    pub overlay: Overlay,
    pub config: DashboardConfig,

    // Data
    pub session: DashboardSession,
    pub adapter: ChartAdapter,
    pub frame: DashboardFrame,
    pub sync: ChartSyncCoordinator<PaneBinding>,

    // View
    pub focus: PaneId,
    pub crosshair: Option<usize>,
    pub hidden_ma: BTreeSet<usize>,
    pub index_cursor: usize,
    pub gate: GateState,
    pub stock_list: Option<StockListState>,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub today: NaiveDate,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        today: NaiveDate,
    ) -> Self {
        let index_cursor = config
            .indices
            .iter()
            .position(|c| c.symbol == config.default_index)
            .unwrap_or(0);
        Self {
            running: true,
            screen: if config.require_email {
                Screen::Gate
            } else {
                Screen::Loading
            },
            overlay: Overlay::None,
            session: DashboardSession::from_config(&config),
            adapter: ChartAdapter::from_config(&config),
            frame: DashboardFrame::default(),
            sync: ChartSyncCoordinator::new(),
            focus: PaneId::Price,
            crosshair: None,
            hidden_ma: BTreeSet::new(),
            index_cursor,
            gate: GateState::default(),
            stock_list: None,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            today,
            config,
        }
    }

    /// Leave the initial screen: stay on the gate, or start loading.
    pub fn start(&mut self) {
        if self.screen != Screen::Gate {
            self.load_selected_index();
        }
    }

    /// Symbol of the index under the selector.
    pub fn selected_index(&self) -> &str {
        self.config
            .indices
            .get(self.index_cursor)
            .map(|c| c.symbol.as_str())
            .unwrap_or(self.config.default_index.as_str())
    }

    pub fn selected_index_name(&self) -> &str {
        self.config.index_name(self.selected_index())
    }

    /// Start a new generation for the selected index and request its
    /// initial window. Panes and overlays of the previous index are dropped.
    pub fn load_selected_index(&mut self) {
        let symbol = self.selected_index().to_string();
        let request = self.session.select_index(&symbol, self.today);

        self.sync.clear();
        for id in PaneId::ALL {
            self.sync.register_pane(id, PaneBinding::new(id));
        }
        self.frame = DashboardFrame::default();
        self.crosshair = None;
        self.stock_list = None;
        if self.overlay == Overlay::StockList {
            self.overlay = Overlay::None;
        }
        self.screen = Screen::Loading;
        self.set_status(format!("Loading {}...", self.selected_index_name()));
        self.dispatch(request);
    }

    /// Cycle to the next configured index.
    pub fn cycle_index(&mut self) {
        let count = self.config.indices.len().max(1);
        self.index_cursor = (self.index_cursor + 1) % count;
        self.load_selected_index();
    }

    fn dispatch(&mut self, request: FetchRequest) {
        let context = format!("{} {}", request.index, request.key);
        if self.worker_tx.send(WorkerCommand::FetchRange { request }).is_err() {
            self.push_error(ErrorCategory::Network, "worker is not running".into(), context);
        }
    }

    // ── Worker and session events ───────────────────────────────────

    pub fn handle_worker_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::RangeFetched { request, result } => {
                let events = self.session.complete(request, result);
                self.apply_events(events);
            }
            WorkerResponse::AboveMa50 {
                index,
                date,
                result,
            } => {
                let Some(list) = self.stock_list.as_mut() else {
                    return;
                };
                if list.index != index || list.date != date {
                    debug!(%index, %date, "dropping stale stock list");
                    return;
                }
                list.loading = false;
                match result {
                    Ok(entries) => list.entries = entries,
                    Err(e) => list.error = Some(e.to_string()),
                }
            }
            WorkerResponse::EmailSubmitted(result) => {
                self.gate.submitting = false;
                match result {
                    Ok(()) => {
                        info!("email accepted");
                        self.gate = GateState::default();
                        self.screen = Screen::Loading;
                        self.load_selected_index();
                    }
                    Err(e) => self.gate.error = Some(e.to_string()),
                }
            }
        }
    }

    /// Fire any due backfill.
    pub fn tick(&mut self, now: Instant) {
        let events = self.session.tick(now);
        self.apply_events(events);
    }

    pub fn apply_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::RangeMerged {
                    request,
                    prepended,
                    total_bars,
                    ..
                } => self.on_range_merged(&request, prepended, total_bars),
                SessionEvent::IndicatorsReady(indicators) => self.rebuild_frame(&indicators),
                SessionEvent::BackfillNeeded(request) => {
                    self.set_status(format!("Loading {}...", request.key));
                    self.dispatch(request);
                }
                SessionEvent::FetchFailed {
                    request,
                    error,
                    fatal,
                } => {
                    if fatal {
                        self.screen = Screen::Error(error.to_string());
                    }
                    self.push_error(ErrorCategory::of(&error), error.to_string(), request.key.to_string());
                }
                SessionEvent::StaleDropped(request) => {
                    debug!(index = %request.index, range = %request.key, "stale response ignored");
                }
                SessionEvent::MergeRejected { request, reason } => {
                    if request.kind == FetchKind::Initial {
                        self.screen = Screen::Error(format!("invalid data: {reason}"));
                    }
                    self.push_error(ErrorCategory::Data, reason, request.key.to_string());
                }
            }
        }
    }

    fn on_range_merged(&mut self, request: &FetchRequest, prepended: usize, total_bars: usize) {
        match request.kind {
            FetchKind::Initial => {
                self.screen = Screen::Dashboard;
                let range = panes::initial_range(total_bars);
                for (_, pane) in self.sync.panes_mut() {
                    pane.set_visible_range(range);
                }
                self.set_status(format!("{} bars loaded", total_bars));
            }
            FetchKind::Backfill => {
                for (_, pane) in self.sync.panes_mut() {
                    pane.shift(prepended);
                }
                if let Some(pos) = self.crosshair.as_mut() {
                    *pos += prepended;
                }
                if prepended == 0 {
                    self.set_warning("No earlier data available");
                } else {
                    self.set_status(format!("Loaded {prepended} earlier bars"));
                }
            }
        }
    }

    fn rebuild_frame(&mut self, indicators: &IndicatorSeries) {
        let merged = self.session.merged();
        self.frame = self.adapter.render(&merged, indicators);
        for (_, pane) in self.sync.panes_mut() {
            pane.load(&self.frame);
        }
        if let Some(pos) = self.crosshair {
            if pos >= self.frame.len() {
                self.crosshair = None;
            }
        }
    }

    // ── View operations ─────────────────────────────────────────────

    /// Visible window of the focused pane.
    pub fn visible_range(&self) -> Option<LogicalRange> {
        self.sync.pane(self.focus).and_then(|p| p.visible_range())
    }

    /// Apply a new window to the focused pane and propagate it.
    pub fn set_range(&mut self, range: LogicalRange, now: Instant) {
        let Some(pane) = self.sync.pane_mut(self.focus) else {
            return;
        };
        pane.set_visible_range(range);
        self.sync.on_visible_range_changed(self.focus, range);
        if self.session.on_visible_range_changed(range, now) {
            debug!(from = range.from, to = range.to, "backfill scheduled");
        }
    }

    /// Move the window by `bars` (negative is back in time).
    pub fn pan(&mut self, bars: f64, now: Instant) {
        if let Some(range) = self.visible_range() {
            self.set_range(range.shifted(bars), now);
        }
    }

    /// Scale the window width by `factor`, keeping its right edge.
    pub fn zoom(&mut self, factor: f64, now: Instant) {
        if let Some(range) = self.visible_range() {
            let max_width = self.frame.len() as f64 + panes::DEFAULT_VISIBLE_BARS;
            self.set_range(panes::zoomed(range, factor, max_width), now);
        }
    }

    /// Pan step: a tenth of the visible window, at least one bar.
    pub fn pan_step(&self) -> f64 {
        self.visible_range()
            .map(|r| (r.width() / 10.0).round().max(1.0))
            .unwrap_or(1.0)
    }

    /// Move the crosshair by `delta` bars. The first move places it on the
    /// last visible bar. The window follows the crosshair.
    pub fn move_crosshair(&mut self, delta: isize, now: Instant) {
        let len = self.frame.len();
        if len == 0 {
            return;
        }
        let visible = self
            .sync
            .pane(self.focus)
            .map(|p| p.visible_bars())
            .unwrap_or(0..len);
        let pos = match self.crosshair {
            Some(pos) => pos.saturating_add_signed(delta).min(len - 1),
            None => visible.end.saturating_sub(1).min(len - 1),
        };
        self.crosshair = Some(pos);

        if let Some(range) = self.visible_range() {
            let p = pos as f64;
            if p < range.from {
                self.set_range(range.shifted(p - range.from), now);
            } else if p > range.to {
                self.set_range(range.shifted(p - range.to), now);
            }
        }

        let date = self.frame.dates[pos];
        if let Some(pane) = self.sync.pane_mut(self.focus) {
            match pane.point_at(date) {
                Some(value) => pane.set_crosshair(date, value),
                None => pane.clear_crosshair(),
            }
        }
        self.sync.on_crosshair_moved(self.focus, Some(date));
    }

    pub fn clear_crosshair(&mut self) {
        self.crosshair = None;
        if let Some(pane) = self.sync.pane_mut(self.focus) {
            pane.clear_crosshair();
        }
        self.sync.on_crosshair_moved(self.focus, None);
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Toggle the MA overlay in `slot` (0-based position in the configured
    /// periods).
    pub fn toggle_ma(&mut self, slot: usize) {
        let Some(&period) = self.session.params().ma_periods.get(slot) else {
            return;
        };
        if !self.hidden_ma.remove(&period) {
            self.hidden_ma.insert(period);
        }
    }

    pub fn ma_visible(&self, period: usize) -> bool {
        !self.hidden_ma.contains(&period)
    }

    /// Bar position the readout and drill-down refer to.
    pub fn focus_position(&self) -> Option<usize> {
        self.crosshair.or_else(|| self.frame.len().checked_sub(1))
    }

    pub fn readout(&self) -> Option<Readout> {
        let pos = self.focus_position()?;
        let merged = self.session.merged();
        let bar = merged.index.get(pos)?;
        let indicators = self.session.indicators();
        let ma = self
            .session
            .params()
            .ma_periods
            .iter()
            .filter(|p| self.ma_visible(**p))
            .map(|&p| (p, indicators.ma(p).and_then(|v| v.get(pos).copied().flatten())))
            .collect();
        Some(Readout {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            turnover: bar.turnover,
            ma,
            breadth: indicators.breadth.get(pos).copied().flatten(),
            net_high_low: indicators.net_high_low.get(pos).copied().unwrap_or(0),
        })
    }

    /// Open the above-MA50 drill-down for the crosshair date.
    pub fn open_stock_list(&mut self) {
        let Some(date) = self.focus_position().map(|pos| self.frame.dates[pos]) else {
            self.set_warning("No data loaded yet");
            return;
        };
        let index = self.selected_index().to_string();
        self.stock_list = Some(StockListState {
            index: index.clone(),
            date,
            entries: Vec::new(),
            loading: true,
            error: None,
            scroll: 0,
        });
        self.overlay = Overlay::StockList;
        if self
            .worker_tx
            .send(WorkerCommand::FetchAboveMa50 { index, date })
            .is_err()
        {
            self.push_error(ErrorCategory::Network, "worker is not running".into(), date.to_string());
        }
    }

    pub fn submit_email(&mut self) {
        if self.gate.submitting {
            return;
        }
        let email = self.gate.input.trim().to_string();
        if let Err(e) = validate_email(&email) {
            self.gate.error = Some(e.to_string());
            return;
        }
        self.gate.error = None;
        self.gate.submitting = true;
        if self.worker_tx.send(WorkerCommand::SubmitEmail { email }).is_err() {
            self.gate.submitting = false;
            self.gate.error = Some("worker is not running".into());
        }
    }

    /// Retry from the error screen.
    pub fn retry(&mut self) {
        if matches!(self.screen, Screen::Error(_)) {
            self.load_selected_index();
        }
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        warn!(category = category.label(), %message, %context, "error recorded");
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    /// Latest indicator snapshot.
    pub fn indicators(&self) -> Arc<IndicatorSeries> {
        self.session.indicators()
    }
}
