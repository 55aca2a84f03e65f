//! Deterministic synthetic provider.
//!
//! Every series is a random walk seeded from its symbol via BLAKE3 and
//! generated forward from a fixed epoch, so overlapping or adjacent requests
//! always agree on the bars they share. Constituents get a random listing
//! date and an optional trading suspension so sparse calendars show up.

use super::provider::{validate_email, DataError, RangeProvider, StockEntry};
use crate::domain::{Bar, FetchedRange, RangeKey, Symbol};
use crate::indicators::sma::sma;
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// First date any synthetic series can trade.
const EPOCH: (i32, u32, u32) = (2000, 1, 3);

pub struct SyntheticProvider {
    constituents: usize,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SyntheticProvider {
    pub fn new(constituents: usize) -> Self {
        Self { constituents }
    }

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(EPOCH.0, EPOCH.1, EPOCH.2).unwrap_or(NaiveDate::MIN)
    }

    /// Constituent tickers for `index`. Stable across calls.
    pub fn constituent_symbols(&self, index: &str) -> Vec<Symbol> {
        let hash = blake3::hash(index.as_bytes());
        let base = u32::from(hash.as_bytes()[0]) * 20 + 1;
        (0..self.constituents as u32)
            .map(|i| format!("HK.{:05}", base + i * 3))
            .collect()
    }

    /// Full history of `symbol` from its listing date through `end`.
    fn history(symbol: &str, end: NaiveDate, listed: bool) -> Vec<Bar> {
        let mut layout_rng = seeded_rng(&format!("{symbol}|layout"));
        let epoch = Self::epoch();

        let listing = if listed {
            epoch + Duration::days(layout_rng.gen_range(0..365 * 12))
        } else {
            epoch
        };
        let suspension = if listed && layout_rng.gen_bool(0.3) {
            let from = listing + Duration::days(layout_rng.gen_range(30..365 * 15));
            Some((from, from + Duration::days(layout_rng.gen_range(5..30))))
        } else {
            None
        };

        generate_walk(symbol, listing, end)
            .into_iter()
            .filter(|bar| match suspension {
                Some((from, to)) => bar.date < from || bar.date > to,
                None => true,
            })
            .collect()
    }

    fn window(symbol: &str, key: RangeKey, listed: bool) -> Vec<Bar> {
        Self::history(symbol, key.end, listed)
            .into_iter()
            .filter(|bar| key.contains(bar.date))
            .collect()
    }
}

impl RangeProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_range(&self, index: &str, key: RangeKey) -> Result<FetchedRange, DataError> {
        if !key.is_ordered() {
            return Err(DataError::InvalidRequest(format!("inverted range {key}")));
        }
        let index_bars = Self::window(index, key, false);
        let constituents: BTreeMap<Symbol, Vec<Bar>> = self
            .constituent_symbols(index)
            .into_iter()
            .map(|sym| {
                let bars = Self::window(&sym, key, true);
                (sym, bars)
            })
            .collect();
        Ok(FetchedRange::new(key, index_bars, constituents))
    }

    fn above_ma50(&self, index: &str, date: NaiveDate) -> Result<Vec<StockEntry>, DataError> {
        let mut out = Vec::new();
        for sym in self.constituent_symbols(index) {
            let history = Self::history(&sym, date, true);
            let Some(last) = history.last() else { continue };
            if last.date != date {
                continue;
            }
            let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
            if let Some(Some(ma)) = sma(&closes, 50).last() {
                if last.close > *ma {
                    out.push(StockEntry {
                        stock_name: format!("SYNTHETIC {}", &sym[3..]),
                        stock_code: sym,
                    });
                }
            }
        }
        Ok(out)
    }

    fn submit_email(&self, email: &str) -> Result<(), DataError> {
        validate_email(email)
    }
}

fn seeded_rng(label: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

/// Weekday random walk for `symbol` over `[start, end]`.
fn generate_walk(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let mut rng = seeded_rng(symbol);
    let mut bars = Vec::new();
    let mut price = rng.gen_range(20.0..400.0_f64);
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let turnover = rng.gen_range(1.0e8..5.0e9);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            turnover,
        });

        price = close;
        current += Duration::days(1);
    }

    bars
}
