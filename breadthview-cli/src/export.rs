//! CSV export of the merged index series with its indicators.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use breadthview_core::adapter::DashboardFrame;
use breadthview_core::indicators::IndicatorSeries;
use breadthview_core::store::MergedSeries;

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Header row: fixed columns around one `ma<period>` column per period.
pub fn header(indicators: &IndicatorSeries) -> Vec<String> {
    let mut cols: Vec<String> = ["date", "time", "open", "high", "low", "close", "turnover"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cols.extend(indicators.ma.keys().map(|p| format!("ma{p}")));
    cols.extend(
        ["breadth", "new_highs", "new_lows", "net_high_low"]
            .iter()
            .map(|s| s.to_string()),
    );
    cols
}

/// Write one row per index bar. Undefined values are empty cells.
pub fn write_csv<W: io::Write>(
    writer: W,
    merged: &MergedSeries,
    indicators: &IndicatorSeries,
    frame: &DashboardFrame,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(indicators))?;

    for (i, bar) in merged.index.iter().enumerate() {
        let mut row = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            frame.times.get(i).map(|t| t.to_string()).unwrap_or_default(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.turnover.to_string(),
        ];
        for values in indicators.ma.values() {
            row.push(opt(values.get(i).copied().flatten()));
        }
        row.push(opt(indicators.breadth.get(i).copied().flatten()));
        row.push(indicators.new_highs.get(i).map(|v| v.to_string()).unwrap_or_default());
        row.push(indicators.new_lows.get(i).map(|v| v.to_string()).unwrap_or_default());
        row.push(indicators.net_high_low.get(i).map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(merged.index.len())
}

pub fn export_csv(
    path: &Path,
    merged: &MergedSeries,
    indicators: &IndicatorSeries,
    frame: &DashboardFrame,
) -> Result<usize> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(io::BufWriter::new(file), merged, indicators, frame)
}
