//! Data provider trait and structured error types.
//!
//! The RangeProvider trait abstracts over the breadth API (HTTP) and the
//! synthetic generator so the session can be driven and tested without a
//! server.

use crate::domain::{FetchedRange, RangeKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Displayable in both CLI and TUI contexts.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether a later attempt may succeed without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::NetworkUnreachable(_) => true,
            DataError::Http { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One row of the above-MA50 drill-down list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub stock_code: String,
    pub stock_name: String,
}

/// Trait for breadth data sources.
///
/// Implementations are blocking; callers run them off the UI thread.
pub trait RangeProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch index and constituent bars for `index` over the inclusive window.
    fn fetch_range(&self, index: &str, key: RangeKey) -> Result<FetchedRange, DataError>;

    /// Constituents of `index` closing above their 50-day average on `date`.
    fn above_ma50(&self, index: &str, date: NaiveDate) -> Result<Vec<StockEntry>, DataError>;

    /// Register an email address with the gate endpoint.
    fn submit_email(&self, email: &str) -> Result<(), DataError>;
}

/// Cheap client-side check before an email is sent to the gate endpoint.
pub fn validate_email(email: &str) -> Result<(), DataError> {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(DataError::InvalidRequest(format!("not an email address: {trimmed:?}")));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || trimmed.contains(' ') {
        return Err(DataError::InvalidRequest(format!("not an email address: {trimmed:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(DataError::NetworkUnreachable("timeout".into()).is_transient());
        assert!(DataError::Http { status: 503 }.is_transient());
        assert!(DataError::Http { status: 429 }.is_transient());
        assert!(!DataError::Http { status: 404 }.is_transient());
        assert!(!DataError::Malformed("no index".into()).is_transient());
    }

    #[test]
    fn http_error_message_matches_status() {
        let err = DataError::Http { status: 502 };
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("trader@example.com").is_ok());
        assert!(validate_email("  trader@example.com ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("trader").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }
}
