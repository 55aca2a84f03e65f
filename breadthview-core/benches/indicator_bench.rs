//! Criterion benchmarks for the recompute path.
//!
//! Benchmarks:
//! 1. Full indicator recompute over a multi-year synthetic universe
//! 2. Range merge (rebuild of the merged snapshot)
//! 3. Single-series SMA and trailing-extreme scans

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use breadthview_core::data::{RangeProvider, SyntheticProvider};
use breadthview_core::domain::{FetchedRange, RangeKey};
use breadthview_core::indicators::high_low::extreme_flags;
use breadthview_core::indicators::{sma, IndicatorEngine};
use breadthview_core::store::RangeStore;
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────

fn yearly_ranges(years: i32, constituents: usize) -> Vec<FetchedRange> {
    let provider = SyntheticProvider::new(constituents);
    (0..years)
        .map(|y| {
            let start = NaiveDate::from_ymd_opt(2023 - y, 1, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(2023 - y, 12, 31).unwrap();
            provider
                .fetch_range("HK.800000", RangeKey::new(start, end))
                .unwrap()
        })
        .collect()
}

fn merged(years: i32, constituents: usize) -> std::sync::Arc<breadthview_core::MergedSeries> {
    let mut store = RangeStore::new();
    for range in yearly_ranges(years, constituents) {
        store.merge(range).unwrap();
    }
    store.snapshot()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_recompute");
    group.sample_size(20);
    let engine = IndicatorEngine::default();
    for years in [1, 3, 5] {
        let series = merged(years, 50);
        group.bench_with_input(BenchmarkId::from_parameter(years), &series, |b, s| {
            b.iter(|| engine.compute(black_box(s)))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let ranges = yearly_ranges(5, 50);
    c.bench_function("merge_five_years", |b| {
        b.iter(|| {
            let mut store = RangeStore::new();
            for range in &ranges {
                store.merge(black_box(range.clone())).unwrap();
            }
            store.snapshot()
        })
    });
}

fn bench_single_series(c: &mut Criterion) {
    let series = merged(5, 1);
    let closes: Vec<f64> = series.index.iter().map(|b| b.close).collect();
    c.bench_function("sma_200", |b| b.iter(|| sma(black_box(&closes), 200)));
    c.bench_function("extreme_flags_260", |b| {
        b.iter(|| extreme_flags(black_box(&series.index), 260))
    });
}

criterion_group!(benches, bench_recompute, bench_merge, bench_single_series);
criterion_main!(benches);
