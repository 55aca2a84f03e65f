//! Backfill controller.
//!
//! Watches the primary pane's visible logical range. When the left edge
//! scrolls past the oldest loaded bar (`from < 0`) it arms a trailing
//! debounce; once the triggers stop for the debounce delay, the next poll
//! yields the key of the year preceding the earliest stored range.
//!
//! At most one backfill is in flight. Triggers that arrive while one is
//! outstanding are ignored, and a key already present in the store is never
//! requested twice.

use crate::domain::RangeKey;
use crate::store::RangeStore;
use crate::sync::LogicalRange;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Trailing-edge deadline timer driven by explicit `now` values.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once per quiet period, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[derive(Debug, Clone)]
pub struct BackfillController {
    debouncer: Debouncer,
    in_flight: Option<RangeKey>,
    exhausted: bool,
}

impl Default for BackfillController {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl BackfillController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(debounce),
            in_flight: None,
            exhausted: false,
        }
    }

    /// Feed a visible-range change from the primary pane.
    ///
    /// Returns true when the change armed the debounce timer.
    pub fn on_visible_range_changed(&mut self, range: LogicalRange, now: Instant) -> bool {
        if range.from >= 0.0 || self.in_flight.is_some() || self.exhausted {
            return false;
        }
        self.debouncer.trigger(now);
        true
    }

    /// Fire a due debounced backfill.
    pub fn poll(&mut self, now: Instant, store: &RangeStore) -> Option<RangeKey> {
        if !self.debouncer.poll(now) {
            return None;
        }
        self.request_now(store)
    }

    /// Start a backfill immediately, bypassing the debounce.
    pub fn request_now(&mut self, store: &RangeStore) -> Option<RangeKey> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }
        let key = Self::next_key(store)?;
        if store.contains(key) {
            debug!(range = %key, "backfill range already loaded");
            return None;
        }
        info!(range = %key, "backfill requested");
        self.in_flight = Some(key);
        Some(key)
    }

    /// The year immediately preceding the earliest stored range.
    pub fn next_key(store: &RangeStore) -> Option<RangeKey> {
        store.earliest_start().and_then(RangeKey::preceding_year)
    }

    /// Clear the in-flight slot after a response for `key` was handled.
    ///
    /// `empty` marks a range with no index bars: there is no older history,
    /// so later triggers are ignored until reset.
    pub fn finish(&mut self, key: RangeKey, empty: bool) {
        if self.in_flight == Some(key) {
            self.in_flight = None;
        }
        if empty {
            info!(range = %key, "no older history available");
            self.exhausted = true;
        }
    }

    /// Clear the in-flight slot after a failed fetch; the next trigger retries.
    pub fn fail(&mut self, key: RangeKey) {
        if self.in_flight == Some(key) {
            self.in_flight = None;
        }
    }

    pub fn in_flight(&self) -> Option<RangeKey> {
        self.in_flight
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.in_flight = None;
        self.exhausted = false;
    }
}
