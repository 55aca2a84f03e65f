//! Data sources: the provider trait, HTTP and synthetic implementations, and
//! wire decoding.

pub mod http;
pub mod provider;
pub mod synthetic;
pub mod wire;

pub use http::HttpProvider;
pub use provider::{validate_email, DataError, RangeProvider, StockEntry};
pub use synthetic::SyntheticProvider;
