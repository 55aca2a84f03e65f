//! BLAKE3 fingerprints of datasets and indicator outputs.
//!
//! Used to check that recomputation is bit-for-bit deterministic and to
//! label CLI output. Floats are hashed by their bit patterns; `None` hashes
//! differently from every float.

use crate::domain::Bar;
use crate::indicators::IndicatorSeries;
use crate::store::MergedSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    fn from_hasher(hasher: blake3::Hasher) -> Self {
        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hash_bar(hasher: &mut blake3::Hasher, bar: &Bar) {
    hasher.update(bar.date.to_string().as_bytes());
    for v in [bar.open, bar.high, bar.low, bar.close, bar.turnover] {
        hasher.update(&v.to_bits().to_le_bytes());
    }
}

fn hash_opt(hasher: &mut blake3::Hasher, value: Option<f64>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            hasher.update(&v.to_bits().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

/// Fingerprint of a merged dataset. Symbols are visited in sorted order.
pub fn dataset_fingerprint(series: &MergedSeries) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"index");
    for bar in &series.index {
        hash_bar(&mut hasher, bar);
    }
    for (symbol, bars) in &series.constituents {
        hasher.update(symbol.as_bytes());
        hasher.update(&(bars.len() as u64).to_le_bytes());
        for bar in bars {
            hash_bar(&mut hasher, bar);
        }
    }
    Fingerprint::from_hasher(hasher)
}

/// Fingerprint of every indicator output.
pub fn indicator_fingerprint(series: &IndicatorSeries) -> Fingerprint {
    let mut hasher = blake3::Hasher::new();
    for date in &series.dates {
        hasher.update(date.to_string().as_bytes());
    }
    for (period, values) in &series.ma {
        hasher.update(&(*period as u64).to_le_bytes());
        for &v in values {
            hash_opt(&mut hasher, v);
        }
    }
    hasher.update(b"breadth");
    for &v in &series.breadth {
        hash_opt(&mut hasher, v);
    }
    hasher.update(b"high_low");
    for ((h, l), net) in series
        .new_highs
        .iter()
        .zip(&series.new_lows)
        .zip(&series.net_high_low)
    {
        hasher.update(&h.to_le_bytes());
        hasher.update(&l.to_le_bytes());
        hasher.update(&net.to_le_bytes());
    }
    Fingerprint::from_hasher(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{compute, make_bars};
    use std::collections::BTreeMap;

    fn series(closes: &[f64]) -> MergedSeries {
        let mut constituents = BTreeMap::new();
        constituents.insert("A".to_string(), make_bars(closes));
        MergedSeries {
            index: make_bars(closes),
            constituents,
        }
    }

    #[test]
    fn same_input_same_fingerprint() {
        let s = series(&[1.0, 2.0, 3.0, 2.5]);
        assert_eq!(dataset_fingerprint(&s), dataset_fingerprint(&s.clone()));
        assert_eq!(
            indicator_fingerprint(&compute(&s, &[2])),
            indicator_fingerprint(&compute(&s, &[2]))
        );
        assert_eq!(dataset_fingerprint(&s).0.len(), 64);
        assert_eq!(dataset_fingerprint(&s).short().len(), 12);
    }

    #[test]
    fn any_change_changes_fingerprint() {
        let a = series(&[1.0, 2.0, 3.0]);
        let b = series(&[1.0, 2.0, 3.000_000_1]);
        assert_ne!(dataset_fingerprint(&a), dataset_fingerprint(&b));
        assert_ne!(
            indicator_fingerprint(&compute(&a, &[2])),
            indicator_fingerprint(&compute(&b, &[2]))
        );
    }
}
