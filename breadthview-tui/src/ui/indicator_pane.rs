//! Breadth line and new-highs-minus-new-lows histogram.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Line as Segment};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use breadthview_core::sync::PaneId;

use crate::app::AppState;
use crate::theme;
use crate::ui::{pane_block, visible_bars, x_bounds, y_bounds};

/// Breadth value range; breadth never leaves [-1, 1].
const BREADTH_BOUNDS: [f64; 2] = [-1.05, 1.05];

pub fn render_breadth(f: &mut Frame, area: Rect, app: &AppState) {
    let pos = app.focus_position();
    let current = pos.and_then(|p| app.frame.breadth.get(p).copied().flatten());
    let title = match current {
        Some(v) => format!(" {} {v:+.3} ", PaneId::Breadth.label()),
        None => format!(" {} ", PaneId::Breadth.label()),
    };
    let block = pane_block(app, PaneId::Breadth, title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bars = visible_bars(app, PaneId::Breadth);
    let segments = gap_segments(bars.map(|i| (i as f64, app.frame.breadth[i])));
    if segments.is_empty() {
        f.render_widget(Paragraph::new(Span::styled("no breadth in view", theme::muted())), inner);
        return;
    }

    let x = x_bounds(app, PaneId::Breadth);
    let zero = [(x[0], 0.0), (x[1], 0.0)];
    let cursor: Vec<(f64, f64)> = app
        .crosshair
        .map(|p| vec![(p as f64, BREADTH_BOUNDS[0]), (p as f64, BREADTH_BOUNDS[1])])
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(theme::muted())
        .graph_type(GraphType::Line)
        .data(&zero)];
    for segment in &segments {
        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .style(Style::default().fg(theme::BREADTH_LINE))
                .graph_type(GraphType::Line)
                .data(segment),
        );
    }
    if !cursor.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .style(Style::default().fg(theme::CROSSHAIR))
                .graph_type(GraphType::Line)
                .data(&cursor),
        );
    }

    let chart = Chart::new(datasets)
        .x_axis(Axis::default().bounds(x))
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds(BREADTH_BOUNDS)
                .labels(vec![
                    Span::styled("-1", theme::muted()),
                    Span::styled("0", theme::muted()),
                    Span::styled("1", theme::muted()),
                ]),
        );
    f.render_widget(chart, inner);
}

pub fn render_high_low(f: &mut Frame, area: Rect, app: &AppState) {
    let pos = app.focus_position();
    let title = match pos.and_then(|p| app.frame.high_low.get(p)) {
        Some(point) => format!(" {} {:+} ", PaneId::HighLow.label(), point.value as i64),
        None => format!(" {} ", PaneId::HighLow.label()),
    };
    let block = pane_block(app, PaneId::HighLow, title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bars = visible_bars(app, PaneId::HighLow);
    let values = bars.clone().map(|i| app.frame.high_low[i].value).chain([0.0]);
    let Some(y) = y_bounds(values) else {
        return;
    };

    let crosshair = app.crosshair;
    let canvas = Canvas::default()
        .marker(Marker::HalfBlock)
        .x_bounds(x_bounds(app, PaneId::HighLow))
        .y_bounds(y)
        .paint(|ctx| {
            for i in bars.clone() {
                let point = app.frame.high_low[i];
                let x = i as f64;
                ctx.draw(&Segment::new(x, 0.0, x, point.value, theme::direction_color(point.rising)));
            }
            if let Some(p) = crosshair {
                ctx.draw(&Segment::new(p as f64, y[0], p as f64, y[1], theme::CROSSHAIR));
            }
        });
    f.render_widget(canvas, inner);
}

/// Split a gappy series into contiguous runs of defined points.
fn gap_segments(points: impl Iterator<Item = (f64, Option<f64>)>) -> Vec<Vec<(f64, f64)>> {
    let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (x, value) in points {
        match value {
            Some(y) => current.push((x, y)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_split_segments() {
        let points = [
            (0.0, None),
            (1.0, Some(0.2)),
            (2.0, Some(0.3)),
            (3.0, None),
            (4.0, None),
            (5.0, Some(-0.1)),
        ];
        let segments = gap_segments(points.into_iter());
        assert_eq!(segments, vec![vec![(1.0, 0.2), (2.0, 0.3)], vec![(5.0, -0.1)]]);
        assert!(gap_segments(std::iter::empty()).is_empty());
    }
}
