//! Top-level UI layout: full-screen states, the three-pane dashboard and the
//! status bar.

pub mod indicator_pane;
pub mod overlays;
pub mod price_pane;
pub mod status_bar;

use std::ops::Range;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use breadthview_core::sync::{ChartHandle, LogicalRange, PaneId};

use crate::app::{AppState, Overlay, Screen};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    f.render_widget(Block::default().style(Style::default().bg(theme::BACKGROUND)), f.area());

    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let main_area = chunks[0];

    match &app.screen {
        Screen::Gate => overlays::render_gate(f, main_area, app),
        Screen::Loading => render_loading(f, main_area, app),
        Screen::Error(message) => render_error(f, main_area, message),
        Screen::Dashboard => draw_dashboard(f, main_area, app),
    }

    status_bar::render(f, chunks[1], app);

    match app.overlay {
        Overlay::Help => overlays::render_help(f, main_area),
        Overlay::StockList => overlays::render_stock_list(f, main_area, app),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::None => {}
    }
}

fn draw_dashboard(f: &mut Frame, area: Rect, app: &AppState) {
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(20),
            Constraint::Percentage(25),
        ])
        .split(area);

    price_pane::render(f, panes[0], app);
    indicator_pane::render_breadth(f, panes[1], app);
    indicator_pane::render_high_low(f, panes[2], app);
}

/// Bordered block for a pane, highlighted when focused.
pub fn pane_block(app: &AppState, id: PaneId, title: String) -> Block<'static> {
    let focused = app.focus == id;
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::pane_border(focused))
        .title(title)
        .title_style(theme::pane_title(focused))
}

/// Bar positions visible in pane `id`.
pub fn visible_bars(app: &AppState, id: PaneId) -> Range<usize> {
    app.sync
        .pane(id)
        .map(|p| p.visible_bars())
        .unwrap_or(0..app.frame.len())
}

/// Horizontal plot bounds: the pane's logical window, half a bar of margin
/// on each side.
pub fn x_bounds(app: &AppState, id: PaneId) -> [f64; 2] {
    let range = app
        .sync
        .pane(id)
        .and_then(|p| p.visible_range())
        .unwrap_or_else(|| LogicalRange::new(0.0, app.frame.len() as f64));
    [range.from - 0.5, range.to + 0.5]
}

/// Vertical bounds over `values` with 5% padding. `None` when there are no
/// finite values.
pub fn y_bounds(values: impl IntoIterator<Item = f64>) -> Option<[f64; 2]> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return None;
    }
    if (max - min).abs() < f64::EPSILON {
        return Some([min - 1.0, max + 1.0]);
    }
    let padding = (max - min) * 0.05;
    Some([min - padding, max + padding])
}

/// Short human form of a large number: 1.2K, 3.4M, 5.6B.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

fn render_loading(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(40, 20, area);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Loading {}...", app.selected_index_name()),
            theme::accent_bold(),
        )),
        Line::from(Span::styled(app.selected_index().to_string(), theme::muted())),
    ];
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), popup);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let popup = centered_rect(60, 40, area);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(" Error ")
        .title_style(theme::negative());
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::negative())),
        Line::from(""),
        Line::from(Span::styled("[r] retry   [q] quit", theme::muted())),
    ];
    let para = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{complete_pending, test_app};
    use breadthview_core::data::SyntheticProvider;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn y_bounds_pads_and_skips_non_finite() {
        let [lo, hi] = y_bounds([1.0, f64::NAN, 3.0]).unwrap();
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);
        assert_eq!(y_bounds([2.0, 2.0]), Some([1.0, 3.0]));
        assert_eq!(y_bounds(std::iter::empty()), None);
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(compact(1_234.0), "1.2K");
        assert_eq!(compact(2_500_000.0), "2.50M");
        assert_eq!(compact(7.1e9), "7.10B");
        assert_eq!(compact(42.0), "42");
    }

    #[test]
    fn draws_gate_screen() {
        let (app, _, _) = test_app(true);
        assert!(rendered(&app).contains("Email"));
    }

    #[test]
    fn draws_dashboard_panes() {
        let (mut app, cmd_rx, _) = test_app(false);
        app.start();
        complete_pending(&mut app, &cmd_rx, &SyntheticProvider::new(4));
        let text = rendered(&app);
        assert!(text.contains("Price"));
        assert!(text.contains("Breadth"));
        assert!(text.contains("New Highs - New Lows"));
    }

    #[test]
    fn draws_error_screen() {
        let (mut app, _, _) = test_app(false);
        app.screen = Screen::Error("HTTP error! status: 503".into());
        let text = rendered(&app);
        assert!(text.contains("HTTP error! status: 503"));
        assert!(text.contains("retry"));
    }
}
