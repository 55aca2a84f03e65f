//! Bar: one trading day of index or constituent data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ticker of an index or one of its constituents (e.g. `HK.800000`, `HK.00700`).
pub type Symbol = String;

/// OHLCV bar for a single symbol on a single trading day.
///
/// The owning series carries the symbol; a bar is identified by `(symbol, date)`
/// for constituents and by `date` alone for the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub turnover: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low and both bracket open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// True when the bar closed above its open.
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}
