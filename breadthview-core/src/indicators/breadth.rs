//! Breadth ratio: the signed share of constituents confirming the index's move.
//!
//! On an up day (index close above the previous close, and always on the
//! first bar) a constituent confirms when it closes above its own MA; on a
//! down or flat day it confirms when it closes below. The value at each index
//! bar is `+C/N` on up days and `-C/N` on down days, where N counts the
//! constituents that traded on that date with a defined MA.

use super::sma::sma_of_closes;
use crate::domain::Bar;
use crate::store::MergedSeries;
use rayon::prelude::*;

/// Direction of each index bar. The first bar counts as up.
pub fn index_direction(index: &[Bar]) -> Vec<bool> {
    index
        .iter()
        .enumerate()
        .map(|(i, bar)| i == 0 || bar.close > index[i - 1].close)
        .collect()
}

/// Breadth ratio aligned to `series.index`. `None` where N is zero.
pub fn breadth(series: &MergedSeries, period: usize) -> Vec<Option<f64>> {
    let n = series.index.len();
    let is_up = index_direction(&series.index);

    // Per-constituent MA over its own history; positional on that series only.
    let per_symbol: Vec<(&Vec<Bar>, Vec<Option<f64>>)> = series
        .constituents
        .par_iter()
        .map(|(_, bars)| (bars, sma_of_closes(bars, period)))
        .collect();

    let mut eligible = vec![0u32; n];
    let mut confirming = vec![0u32; n];

    for (bars, ma) in &per_symbol {
        for (bar, ma) in bars.iter().zip(ma) {
            let Some(ma) = ma else { continue };
            let Some(pos) = series.index_position(bar.date) else {
                continue;
            };
            eligible[pos] += 1;
            let confirms = if is_up[pos] {
                bar.close > *ma
            } else {
                bar.close < *ma
            };
            if confirms {
                confirming[pos] += 1;
            }
        }
    }

    (0..n)
        .map(|i| {
            if eligible[i] == 0 {
                return None;
            }
            let share = f64::from(confirming[i]) / f64::from(eligible[i]);
            let value = if is_up[i] { share } else { -share };
            // -0.0 reads as a down day with no confirmation; report it as 0.
            Some(if value == 0.0 { 0.0 } else { value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars_from, DEFAULT_EPSILON};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn series(index: &[f64], constituents: &[(&str, usize, &[f64])]) -> MergedSeries {
        let mut map = BTreeMap::new();
        for (sym, offset, closes) in constituents {
            map.insert(sym.to_string(), make_bars_from(base(), *offset, closes));
        }
        MergedSeries {
            index: make_bars_from(base(), 0, index),
            constituents: map,
        }
    }

    #[test]
    fn first_bar_counts_as_up() {
        let dir = index_direction(&make_bars_from(base(), 0, &[10.0, 9.0, 9.0, 11.0]));
        assert_eq!(dir, vec![true, false, false, true]);
    }

    #[test]
    fn up_day_counts_closes_above_ma() {
        // Period 2. Index rises on day 2.
        let s = series(
            &[100.0, 101.0, 102.0],
            &[
                ("A", 0, &[10.0, 12.0, 14.0]), // ma at day 2 = 13, close 14 above
                ("B", 0, &[10.0, 12.0, 11.0]), // ma at day 2 = 11.5, close 11 below
            ],
        );
        let b = breadth(&s, 2);
        assert_eq!(b[0], None);
        assert_approx(b[1].unwrap(), 1.0, DEFAULT_EPSILON);
        assert_approx(b[2].unwrap(), 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn down_day_is_negative() {
        let s = series(
            &[100.0, 101.0, 99.0],
            &[
                ("A", 0, &[10.0, 12.0, 10.0]), // ma 11, close below -> confirms
                ("B", 0, &[10.0, 12.0, 13.0]),
                ("C", 0, &[10.0, 12.0, 9.0]), // confirms
            ],
        );
        let b = breadth(&s, 2);
        assert_approx(b[2].unwrap(), -2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn no_confirmation_on_down_day_is_positive_zero() {
        let s = series(&[100.0, 101.0, 99.0], &[("A", 0, &[10.0, 12.0, 14.0])]);
        let b = breadth(&s, 2);
        let v = b[2].unwrap();
        assert_eq!(v, 0.0);
        assert!(v.is_sign_positive());
    }

    #[test]
    fn gapped_constituent_is_excluded_by_date() {
        // B starts one day late: its first MA(2) sample lands on day 2.
        let s = series(
            &[100.0, 101.0, 102.0],
            &[("A", 0, &[10.0, 12.0, 14.0]), ("B", 1, &[20.0, 10.0])],
        );
        let b = breadth(&s, 2);
        // Day 1: only A eligible (above MA) -> 1.0
        assert_approx(b[1].unwrap(), 1.0, DEFAULT_EPSILON);
        // Day 2: A above, B (ma 15, close 10) below -> 0.5
        assert_approx(b[2].unwrap(), 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn constituent_dates_outside_index_are_ignored() {
        let s = series(&[100.0, 101.0], &[("A", 5, &[1.0, 2.0, 3.0])]);
        assert!(breadth(&s, 2).iter().all(Option::is_none));
    }
}
