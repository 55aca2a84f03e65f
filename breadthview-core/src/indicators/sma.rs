//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the last `period` values ending at each position.
//! Each window is summed directly, oldest to newest, so a value never depends
//! on how much history precedes its window.

use crate::domain::Bar;

/// SMA over arbitrary values. `None` until `period` values are available.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        let sum: f64 = window.iter().sum();
        result[i] = Some(sum / period as f64);
    }
    result
}

/// SMA of bar closes.
pub fn sma_of_closes(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    sma(&closes, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_basic() {
        let ma = sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        assert_approx(ma[2].unwrap(), 20.0, DEFAULT_EPSILON);
        assert_approx(ma[3].unwrap(), 30.0, DEFAULT_EPSILON);
        assert_approx(ma[4].unwrap(), 40.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let values = [3.0, 1.5, 7.25];
        let ma = sma(&values, 1);
        for (v, m) in values.iter().zip(&ma) {
            assert_eq!(Some(*v), *m);
        }
    }

    #[test]
    fn sma_too_short_or_zero_period() {
        assert!(sma(&[1.0, 2.0], 3).iter().all(Option::is_none));
        assert!(sma(&[1.0, 2.0], 0).iter().all(Option::is_none));
        assert!(sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_of_closes_matches_values() {
        let bars = make_bars(&[100.0, 102.0, 101.0, 105.0, 107.0]);
        let ma = sma_of_closes(&bars, 3);
        assert_eq!(ma[1], None);
        assert_approx(ma[2].unwrap(), 101.0, DEFAULT_EPSILON);
        assert_approx(ma[3].unwrap(), 308.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(ma[4].unwrap(), 313.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn prefix_does_not_change_later_values() {
        let tail = [5.0, 6.0, 7.0, 8.0];
        let mut full = vec![100.0, 200.0, 300.0];
        full.extend_from_slice(&tail);
        let short = sma(&tail, 2);
        let long = sma(&full, 2);
        assert_eq!(short[1..], long[4..]);
    }
}
