//! Domain types: bars and fetched ranges.

pub mod bar;
pub mod range;

pub use bar::{Bar, Symbol};
pub use range::{FetchedRange, RangeKey};
