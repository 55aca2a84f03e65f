//! Price pane: candles, MA overlays, turnover histogram and the readout of
//! the crosshair bar.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as Segment};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use breadthview_core::sync::PaneId;

use crate::app::{AppState, Readout};
use crate::theme;
use crate::ui::{compact, pane_block, visible_bars, x_bounds, y_bounds};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let title = format!(
        " {} | {} ({}) ",
        PaneId::Price.label(),
        app.selected_index_name(),
        app.selected_index()
    );
    let block = pane_block(app, PaneId::Price, title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Percentage(22),
        ])
        .split(inner);

    f.render_widget(Paragraph::new(readout_line(app.readout().as_ref())), rows[0]);
    render_candles(f, rows[1], app);
    render_turnover(f, rows[2], app);
}

fn readout_line(readout: Option<&Readout>) -> Line<'static> {
    let Some(r) = readout else {
        return Line::from(Span::styled("no data", theme::muted()));
    };
    let mut spans = vec![
        Span::styled(format!("{} ", r.date), theme::accent_bold()),
        Span::styled(
            format!("O {:.2} H {:.2} L {:.2} C {:.2} ", r.open, r.high, r.low, r.close),
            theme::direction_style(r.close >= r.open),
        ),
        Span::styled(format!("T {} ", compact(r.turnover)), theme::muted()),
    ];
    for (period, value) in &r.ma {
        let text = match value {
            Some(v) => format!("MA{period} {v:.2} "),
            None => format!("MA{period} - "),
        };
        spans.push(Span::styled(text, Style::default().fg(theme::ma_color(*period))));
    }
    if let Some(b) = r.breadth {
        spans.push(Span::styled(format!("B {b:+.2} "), theme::accent()));
    }
    spans.push(Span::styled(
        format!("NH-NL {:+}", r.net_high_low),
        theme::direction_style(r.net_high_low >= 0),
    ));
    Line::from(spans)
}

fn render_candles(f: &mut Frame, area: Rect, app: &AppState) {
    let frame = &app.frame;
    let bars = visible_bars(app, PaneId::Price);

    let mut extremes: Vec<f64> = Vec::new();
    for i in bars.clone() {
        if let Some(c) = frame.price.candles[i] {
            extremes.push(c.high);
            extremes.push(c.low);
        }
    }
    let Some(y) = y_bounds(extremes) else {
        f.render_widget(Paragraph::new(Span::styled("no bars in view", theme::muted())), area);
        return;
    };

    let crosshair = app.crosshair;
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds(x_bounds(app, PaneId::Price))
        .y_bounds(y)
        .paint(|ctx| {
            for i in bars.clone() {
                let Some(c) = frame.price.candles[i] else { continue };
                let x = i as f64;
                let color = theme::direction_color(c.close > c.open);
                ctx.draw(&Segment::new(x, c.low, x, c.high, color));
                ctx.draw(&Segment::new(x - 0.3, c.open, x, c.open, color));
                ctx.draw(&Segment::new(x, c.close, x + 0.3, c.close, color));
            }
            ctx.layer();
            for line in &frame.price.ma_lines {
                if !app.ma_visible(line.period) {
                    continue;
                }
                let color = theme::ma_color(line.period);
                for i in bars.clone().skip(1) {
                    if let (Some(a), Some(b)) = (line.values[i - 1], line.values[i]) {
                        ctx.draw(&Segment::new((i - 1) as f64, a, i as f64, b, color));
                    }
                }
            }
            if let Some(pos) = crosshair {
                ctx.draw(&Segment::new(pos as f64, y[0], pos as f64, y[1], theme::CROSSHAIR));
            }
        });
    f.render_widget(canvas, area);
}

fn render_turnover(f: &mut Frame, area: Rect, app: &AppState) {
    let frame = &app.frame;
    let bars = visible_bars(app, PaneId::Price);
    let top = bars
        .clone()
        .map(|i| frame.price.turnover[i].value)
        .fold(0.0_f64, f64::max);
    if top <= 0.0 {
        return;
    }

    let canvas = Canvas::default()
        .marker(Marker::HalfBlock)
        .x_bounds(x_bounds(app, PaneId::Price))
        .y_bounds([0.0, top])
        .paint(|ctx| {
            for i in bars.clone() {
                let point = frame.price.turnover[i];
                let x = i as f64;
                ctx.draw(&Segment::new(x, 0.0, x, point.value, theme::direction_color(point.rising)));
            }
        });
    f.render_widget(canvas, area);
}
