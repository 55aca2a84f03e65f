//! Overlay widgets: email gate, help, above-MA50 drill-down, error history.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

/// Email gate shown before the dashboard.
pub fn render_gate(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(60, 40, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" BreadthView ")
        .title_style(theme::accent_bold());

    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Enter your Email to access the breadth dashboard:",
            theme::muted(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", theme::accent()),
            Span::styled(app.gate.input.as_str(), theme::accent_bold()),
            Span::styled("_", theme::accent()),
        ]),
        Line::from(""),
    ];
    if app.gate.submitting {
        text.push(Line::from(Span::styled("Submitting...", theme::muted())));
    } else if let Some(err) = &app.gate.error {
        text.push(Line::from(Span::styled(err.as_str(), theme::negative())));
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled("[Enter] submit   [Esc] quit", theme::muted())));

    let para = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}

/// Keyboard reference.
pub fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Help [Esc]close ")
        .title_style(theme::accent_bold());

    let mut lines: Vec<Line> = Vec::new();
    section(&mut lines, "Navigation");
    key(&mut lines, "h / l, ← / →", "Pan the focused pane");
    key(&mut lines, "+ / -", "Zoom in / out");
    key(&mut lines, ", / .", "Move the crosshair");
    key(&mut lines, "Esc", "Hide the crosshair");
    key(&mut lines, "Tab", "Cycle pane focus");
    lines.push(Line::from(""));

    section(&mut lines, "Data");
    key(&mut lines, "1-5", "Toggle MA overlays");
    key(&mut lines, "i", "Next index");
    key(&mut lines, "s", "Stocks above MA50 on the crosshair date");
    key(&mut lines, "e", "Error history");
    lines.push(Line::from(""));

    key(&mut lines, "?", "This help");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Panning past the oldest bar loads the previous year.",
        theme::muted(),
    )));

    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn section(lines: &mut Vec<Line<'static>>, title: &'static str) {
    lines.push(Line::from(Span::styled(title, theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'static>>, keys: &'static str, desc: &'static str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {keys:>14}  "), theme::warning()),
        Span::styled(desc, theme::muted()),
    ]));
}

/// Drill-down list of constituents closing above their MA50.
pub fn render_stock_list(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let Some(list) = &app.stock_list else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(format!(
            " Stocks above MA50 | {} | {} ({}) [Esc]close [j/k]scroll ",
            list.date,
            list.index,
            list.entries.len()
        ))
        .title_style(theme::accent_bold());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let message = if list.loading {
        Some(Span::styled("Loading...", theme::muted()))
    } else if let Some(err) = &list.error {
        Some(Span::styled(err.as_str(), theme::negative()))
    } else if list.entries.is_empty() {
        Some(Span::styled("No constituents above MA50 on this date.", theme::muted()))
    } else {
        None
    };
    if let Some(span) = message {
        f.render_widget(Paragraph::new(span), inner);
        return;
    }

    let rows: Vec<Row> = list
        .entries
        .iter()
        .skip(list.scroll)
        .map(|e| {
            Row::new(vec![
                Cell::from(Span::styled(e.stock_code.as_str(), theme::accent())),
                Cell::from(e.stock_name.as_str()),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
        .header(Row::new(vec!["Code", "Name"]).style(theme::muted().add_modifier(Modifier::BOLD)));
    f.render_widget(table, inner);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        let text = Paragraph::new(Span::styled("No errors recorded.", theme::muted()));
        f.render_widget(text, inner);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app.error_history.iter().enumerate().skip(app.error_scroll) {
        let style = if i == app.error_scroll {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", err.timestamp.format("%H:%M:%S")), theme::muted()),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
            Span::styled(err.message.as_str(), style),
        ]));
        if !err.context.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(err.context.as_str(), theme::muted()),
            ]));
        }
        if lines.len() >= inner.height as usize {
            break;
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}
