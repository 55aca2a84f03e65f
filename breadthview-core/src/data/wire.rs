//! JSON payload decoding for the breadth API.
//!
//! The server returns `{ index: [...], constituents: { SYM: [...] } }` where
//! each bar carries `time_key` plus OHLC and turnover. Decoding is done on
//! `serde_json::Value` so that a single bad bar can be dropped without
//! rejecting the whole range.

use super::provider::{DataError, StockEntry};
use crate::domain::{Bar, FetchedRange, RangeKey, Symbol};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Decode an `/api/index_kline` response body into a FetchedRange.
pub fn decode_range(key: RangeKey, body: &Value) -> Result<FetchedRange, DataError> {
    let index_raw = body
        .get("index")
        .ok_or_else(|| DataError::Malformed("missing `index` field".into()))?
        .as_array()
        .ok_or_else(|| DataError::Malformed("`index` is not an array".into()))?;
    let index = decode_series("index", index_raw)?;

    let mut constituents = BTreeMap::new();
    match body.get("constituents") {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (symbol, raw) in map {
                let arr = raw.as_array().ok_or_else(|| {
                    DataError::Malformed(format!("constituent {symbol} is not an array"))
                })?;
                constituents.insert(symbol.clone(), decode_series(symbol, arr)?);
            }
        }
        Some(_) => {
            return Err(DataError::Malformed("`constituents` is not an object".into()));
        }
    }

    Ok(FetchedRange::new(key, index, constituents))
}

/// Decode one bar array. Bars with a null or missing OHLC field are dropped.
fn decode_series(symbol: &str, raw: &[Value]) -> Result<Vec<Bar>, DataError> {
    let mut bars = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for item in raw {
        let obj = item
            .as_object()
            .ok_or_else(|| DataError::Malformed(format!("{symbol}: bar is not an object")))?;

        let time_key = obj
            .get("time_key")
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::Malformed(format!("{symbol}: bar without time_key")))?;
        let date = parse_time_key(time_key)
            .ok_or_else(|| DataError::Malformed(format!("{symbol}: bad time_key {time_key:?}")))?;

        let field = |name: &str| obj.get(name).and_then(Value::as_f64);
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field("open"), field("high"), field("low"), field("close"))
        else {
            dropped += 1;
            continue;
        };

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            turnover: field("turnover").unwrap_or(0.0),
        });
    }

    if dropped > 0 {
        warn!(symbol, dropped, "dropped bars with missing OHLC values");
    }
    Ok(bars)
}

/// Accepts `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` (the server's datetime form).
pub fn parse_time_key(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

#[derive(Debug, Deserialize)]
struct AboveMa50Response {
    #[serde(default)]
    stocks: Vec<StockEntry>,
}

/// Decode an `/api/above_ma50` response body.
pub fn decode_stock_list(body: &Value) -> Result<Vec<StockEntry>, DataError> {
    let resp: AboveMa50Response = serde_json::from_value(body.clone())
        .map_err(|e| DataError::Malformed(format!("stock list: {e}")))?;
    Ok(resp.stocks)
}

/// Encode a bar the way the server does; used by tests and the synthetic provider.
pub fn encode_bar(bar: &Bar) -> Value {
    serde_json::json!({
        "time_key": format!("{} 00:00:00", bar.date.format("%Y-%m-%d")),
        "open": bar.open,
        "high": bar.high,
        "low": bar.low,
        "close": bar.close,
        "turnover": bar.turnover,
    })
}

/// Encode a whole range into the `/api/index_kline` body shape.
pub fn encode_range(range: &FetchedRange) -> Value {
    let constituents: serde_json::Map<String, Value> = range
        .constituents
        .iter()
        .map(|(sym, bars): (&Symbol, &Vec<Bar>)| {
            (sym.clone(), Value::Array(bars.iter().map(encode_bar).collect()))
        })
        .collect();
    serde_json::json!({
        "index": range.index.iter().map(encode_bar).collect::<Vec<_>>(),
        "constituents": constituents,
    })
}
