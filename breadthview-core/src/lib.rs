//! BreadthView core: incremental range merging, breadth indicators and
//! multi-pane chart synchronization for a market-breadth dashboard.
//!
//! Data flow: a provider fetches a `FetchedRange`, the `RangeStore` merges it
//! into a `MergedSeries`, the `IndicatorEngine` recomputes an
//! `IndicatorSeries` from scratch, the `ChartAdapter` lays both out per pane,
//! and the `ChartSyncCoordinator` keeps the panes on one window. The
//! `BackfillController` watches the primary pane and asks for older data.
//! `DashboardSession` ties these together for one selected index.

pub mod adapter;
pub mod backfill;
pub mod config;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod indicators;
pub mod session;
pub mod store;
pub mod sync;

pub use adapter::{ChartAdapter, DashboardFrame};
pub use backfill::{BackfillController, Debouncer};
pub use config::{ConfigError, DashboardConfig};
pub use data::{DataError, RangeProvider};
pub use domain::{Bar, FetchedRange, RangeKey, Symbol};
pub use indicators::{IndicatorEngine, IndicatorParams, IndicatorSeries};
pub use session::{DashboardSession, FetchKind, FetchRequest, SessionEvent};
pub use store::{MergedSeries, RangeStore, StoreError};
pub use sync::{ChartHandle, ChartSyncCoordinator, LogicalRange, PaneId};
