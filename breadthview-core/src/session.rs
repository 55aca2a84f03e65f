//! Dashboard session: the per-index owner of the range store, indicator
//! snapshot and backfill controller.
//!
//! The session never performs I/O. It hands out `FetchRequest`s and takes
//! the outcome back through `complete`, so a fetch can run anywhere (worker
//! thread, inline in the CLI) while all state changes happen on the caller's
//! thread.
//!
//! Each `select_index` starts a new generation. A response carrying an older
//! generation, or a different index, is stale and is dropped unmerged.

use crate::backfill::BackfillController;
use crate::config::DashboardConfig;
use crate::data::DataError;
use crate::domain::{FetchedRange, RangeKey, Symbol};
use crate::indicators::{IndicatorEngine, IndicatorParams, IndicatorSeries};
use crate::store::{MergedSeries, RangeStore, StoreError};
use crate::sync::LogicalRange;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_INITIAL_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Backfill,
}

/// A fetch the session wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub index: Symbol,
    pub key: RangeKey,
    pub kind: FetchKind,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A range was merged; `merged` is the new snapshot. `prepended` index
    /// bars now precede the previous first bar.
    RangeMerged {
        request: FetchRequest,
        merged: Arc<MergedSeries>,
        prepended: usize,
        total_bars: usize,
    },
    IndicatorsReady(Arc<IndicatorSeries>),
    BackfillNeeded(FetchRequest),
    FetchFailed {
        request: FetchRequest,
        error: DataError,
        fatal: bool,
    },
    StaleDropped(FetchRequest),
    MergeRejected {
        request: FetchRequest,
        reason: String,
    },
}

#[derive(Debug)]
pub struct DashboardSession {
    generation: u64,
    index: Option<Symbol>,
    store: RangeStore,
    engine: IndicatorEngine,
    backfill: BackfillController,
    indicators: Arc<IndicatorSeries>,
    initial_window_days: i64,
    initial_pending: bool,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(
            IndicatorParams::default(),
            crate::backfill::DEFAULT_DEBOUNCE,
            DEFAULT_INITIAL_WINDOW_DAYS,
        )
    }
}

impl DashboardSession {
    pub fn new(params: IndicatorParams, debounce: Duration, initial_window_days: i64) -> Self {
        Self {
            generation: 0,
            index: None,
            store: RangeStore::new(),
            engine: IndicatorEngine::new(params),
            backfill: BackfillController::new(debounce),
            indicators: Arc::new(IndicatorSeries::default()),
            initial_window_days,
            initial_pending: false,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.indicators.clone(),
            config.backfill_debounce(),
            config.initial_window_days,
        )
    }

    /// Switch to `index`: drop everything loaded so far and request the
    /// trailing window ending `today`.
    pub fn select_index(&mut self, index: &str, today: NaiveDate) -> FetchRequest {
        self.generation += 1;
        self.index = Some(index.to_string());
        self.store.clear();
        self.backfill.reset();
        self.indicators = Arc::new(IndicatorSeries::default());
        self.initial_pending = true;

        let key = RangeKey::trailing(today, self.initial_window_days).unwrap_or_else(|| {
            warn!(days = self.initial_window_days, "initial window out of range, loading all history");
            RangeKey::new(NaiveDate::MIN, today)
        });
        info!(index, generation = self.generation, range = %key, "index selected");
        FetchRequest {
            generation: self.generation,
            index: index.to_string(),
            key,
            kind: FetchKind::Initial,
        }
    }

    /// Forward a visible-range change of the primary pane.
    pub fn on_visible_range_changed(&mut self, range: LogicalRange, now: Instant) -> bool {
        if self.initial_pending || self.store.is_empty() {
            return false;
        }
        self.backfill.on_visible_range_changed(range, now)
    }

    /// Fire a due debounced backfill.
    pub fn poll(&mut self, now: Instant) -> Option<FetchRequest> {
        let key = self.backfill.poll(now, &self.store)?;
        self.backfill_request(key)
    }

    /// `poll`, reported as events.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        self.poll(now)
            .map(SessionEvent::BackfillNeeded)
            .into_iter()
            .collect()
    }

    /// Request the next backfill immediately.
    pub fn request_backfill(&mut self) -> Option<FetchRequest> {
        if self.initial_pending {
            return None;
        }
        let key = self.backfill.request_now(&self.store)?;
        self.backfill_request(key)
    }

    fn backfill_request(&mut self, key: RangeKey) -> Option<FetchRequest> {
        let Some(index) = self.index.clone() else {
            self.backfill.fail(key);
            return None;
        };
        Some(FetchRequest {
            generation: self.generation,
            index,
            key,
            kind: FetchKind::Backfill,
        })
    }

    pub fn is_current(&self, request: &FetchRequest) -> bool {
        request.generation == self.generation && self.index.as_deref() == Some(request.index.as_str())
    }

    /// Apply the outcome of `request`.
    pub fn complete(
        &mut self,
        request: FetchRequest,
        result: Result<FetchedRange, DataError>,
    ) -> Vec<SessionEvent> {
        if !self.is_current(&request) {
            debug!(
                index = %request.index,
                generation = request.generation,
                current = self.generation,
                range = %request.key,
                "dropping stale response"
            );
            return vec![SessionEvent::StaleDropped(request)];
        }

        let range = match result {
            Ok(range) => range,
            Err(DataError::Malformed(reason)) => {
                self.settle(&request, false, false);
                warn!(range = %request.key, %reason, "rejected malformed payload");
                return vec![SessionEvent::MergeRejected { request, reason }];
            }
            Err(error) => {
                let fatal = request.kind == FetchKind::Initial;
                self.settle(&request, false, false);
                warn!(range = %request.key, %error, fatal, "fetch failed");
                return vec![SessionEvent::FetchFailed {
                    request,
                    error,
                    fatal,
                }];
            }
        };

        let previous = self.store.snapshot();
        let empty = range.index.is_empty();
        let merged = match self.store.merge(range) {
            Ok(merged) => merged,
            Err(StoreError::MalformedRange { reason, .. }) => {
                self.settle(&request, false, false);
                warn!(range = %request.key, %reason, "rejected malformed range");
                return vec![SessionEvent::MergeRejected { request, reason }];
            }
        };
        self.settle(&request, true, empty);

        let prepended = prepended_bars(&previous, &merged);
        let mut events = vec![SessionEvent::RangeMerged {
            request,
            merged: Arc::clone(&merged),
            prepended,
            total_bars: merged.len(),
        }];
        if !Arc::ptr_eq(&previous, &merged) {
            self.indicators = Arc::new(self.engine.compute(&merged));
            events.push(SessionEvent::IndicatorsReady(Arc::clone(&self.indicators)));
        }
        events
    }

    fn settle(&mut self, request: &FetchRequest, merged: bool, empty: bool) {
        match request.kind {
            FetchKind::Initial => self.initial_pending = false,
            FetchKind::Backfill if merged => self.backfill.finish(request.key, empty),
            FetchKind::Backfill => self.backfill.fail(request.key),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    pub fn store(&self) -> &RangeStore {
        &self.store
    }

    pub fn merged(&self) -> Arc<MergedSeries> {
        self.store.snapshot()
    }

    pub fn indicators(&self) -> Arc<IndicatorSeries> {
        Arc::clone(&self.indicators)
    }

    pub fn backfill(&self) -> &BackfillController {
        &self.backfill
    }

    pub fn params(&self) -> &IndicatorParams {
        self.engine.params()
    }

    pub fn is_loading(&self) -> bool {
        self.initial_pending
    }
}

/// Index bars in `next` dated before the first bar of `previous`.
fn prepended_bars(previous: &MergedSeries, next: &MergedSeries) -> usize {
    match previous.first_date() {
        Some(first) => next.index.partition_point(|b| b.date < first),
        None => 0,
    }
}
