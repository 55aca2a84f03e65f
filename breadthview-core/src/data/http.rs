//! HTTP provider for the breadth API.
//!
//! Blocking reqwest client with a request timeout and bounded retries with
//! exponential backoff on connect/timeout failures and 5xx/429 responses.

use super::provider::{validate_email, DataError, RangeProvider, StockEntry};
use super::wire;
use crate::domain::{FetchedRange, RangeKey};
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HttpProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpProvider {
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("breadthview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn kline_url(&self, index: &str, key: RangeKey) -> String {
        format!(
            "{}/api/index_kline?index={index}&start_date={}&end_date={}",
            self.base_url,
            key.start.format("%Y-%m-%d"),
            key.end.format("%Y-%m-%d")
        )
    }

    fn above_ma50_url(&self, index: &str, date: NaiveDate) -> String {
        format!(
            "{}/api/above_ma50?date={}&index={index}",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }

    /// Send a request built by `build`, retrying transient failures.
    fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Value, DataError>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                debug!(what, attempt, ?delay, "retrying");
                std::thread::sleep(delay);
            }

            match build().send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        let err = DataError::Http {
                            status: status.as_u16(),
                        };
                        if err.is_transient() {
                            warn!(what, status = status.as_u16(), "transient HTTP failure");
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }

                    // Endpoints that answer with an empty 2xx body are fine.
                    let text = resp
                        .text()
                        .map_err(|e| DataError::Malformed(format!("{what}: {e}")))?;
                    if text.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    return serde_json::from_str(&text)
                        .map_err(|e| DataError::Malformed(format!("{what}: {e}")));
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl RangeProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_range(&self, index: &str, key: RangeKey) -> Result<FetchedRange, DataError> {
        if !key.is_ordered() {
            return Err(DataError::InvalidRequest(format!("inverted range {key}")));
        }
        let url = self.kline_url(index, key);
        info!(index, range = %key, "fetching range");
        let body = self.send_with_retry("index_kline", || self.client.get(&url))?;
        let range = wire::decode_range(key, &body)?;
        debug!(index, range = %key, bars = range.bar_count(), "range decoded");
        Ok(range)
    }

    fn above_ma50(&self, index: &str, date: NaiveDate) -> Result<Vec<StockEntry>, DataError> {
        let url = self.above_ma50_url(index, date);
        let body = self.send_with_retry("above_ma50", || self.client.get(&url))?;
        wire::decode_stock_list(&body)
    }

    fn submit_email(&self, email: &str) -> Result<(), DataError> {
        validate_email(email)?;
        let url = format!("{}/api/email", self.base_url);
        let payload = serde_json::json!({ "email": email.trim() });
        self.send_with_retry("email", || self.client.post(&url).json(&payload))?;
        info!("email submitted");
        Ok(())
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}
