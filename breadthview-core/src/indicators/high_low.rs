//! 52-week new highs and new lows.
//!
//! For each constituent, a bar is a new high when its `high` equals the
//! maximum `high` over the trailing window of that symbol's own samples
//! (the bar included), and a new low when its `low` equals the window
//! minimum. Partial windows at the start of a series count. Equality is
//! exact.

use crate::domain::Bar;
use crate::store::MergedSeries;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Per-date counts aligned to the index series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighLowCounts {
    pub new_highs: Vec<u32>,
    pub new_lows: Vec<u32>,
    pub net: Vec<i64>,
}

/// New-high and new-low flags for one series, computed with monotonic deques.
pub fn extreme_flags(bars: &[Bar], window: usize) -> Vec<(bool, bool)> {
    let window = window.max(1);
    let mut max_q: VecDeque<usize> = VecDeque::new();
    let mut min_q: VecDeque<usize> = VecDeque::new();
    let mut flags = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let oldest = (i + 1).saturating_sub(window);
        while max_q.front().is_some_and(|&j| j < oldest) {
            max_q.pop_front();
        }
        while min_q.front().is_some_and(|&j| j < oldest) {
            min_q.pop_front();
        }

        // Anything at the back that is not strictly above (below) the new
        // value can never be the window extreme again.
        while max_q.back().is_some_and(|&j| bars[j].high <= bar.high) {
            max_q.pop_back();
        }
        while min_q.back().is_some_and(|&j| bars[j].low >= bar.low) {
            min_q.pop_back();
        }
        max_q.push_back(i);
        min_q.push_back(i);

        // The front is the new bar only when nothing in the window beats it.
        flags.push((max_q.front() == Some(&i), min_q.front() == Some(&i)));
    }
    flags
}

/// Count new highs and lows per index date across all constituents.
pub fn high_low_counts(series: &MergedSeries, window: usize) -> HighLowCounts {
    let n = series.index.len();

    let per_symbol: Vec<(&Vec<Bar>, Vec<(bool, bool)>)> = series
        .constituents
        .par_iter()
        .map(|(_, bars)| (bars, extreme_flags(bars, window)))
        .collect();

    let mut new_highs = vec![0u32; n];
    let mut new_lows = vec![0u32; n];

    for (bars, flags) in &per_symbol {
        for (bar, &(high, low)) in bars.iter().zip(flags) {
            if !(high || low) {
                continue;
            }
            let Some(pos) = series.index_position(bar.date) else {
                continue;
            };
            if high {
                new_highs[pos] += 1;
            }
            if low {
                new_lows[pos] += 1;
            }
        }
    }

    let net = new_highs
        .iter()
        .zip(&new_lows)
        .map(|(&h, &l)| i64::from(h) - i64::from(l))
        .collect();

    HighLowCounts {
        new_highs,
        new_lows,
        net,
    }
}
