//! BreadthView terminal dashboard: a price pane, a breadth pane and a new
//! highs/lows pane kept on one window, backed by a worker thread that talks
//! to the breadth API.

pub mod app;
pub mod input;
pub mod panes;
pub mod theme;
pub mod ui;
pub mod worker;

#[cfg(test)]
mod test_helpers;
