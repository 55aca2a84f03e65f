//! Bottom status bar: focus, MA toggles, backfill state, last message.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, Screen, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    if app.screen == Screen::Dashboard {
        spans.push(Span::styled(format!(" [{}] ", app.focus.label()), theme::accent_bold()));
        for (slot, &period) in app.session.params().ma_periods.iter().enumerate() {
            let style = if app.ma_visible(period) {
                Style::default().fg(theme::ma_color(period))
            } else {
                theme::muted()
            };
            spans.push(Span::styled(format!("{}:MA{period} ", slot + 1), style));
        }
        spans.push(Span::styled(format!("| {} bars ", app.frame.len()), theme::muted()));

        let backfill = app.session.backfill();
        if let Some(key) = backfill.in_flight() {
            spans.push(Span::styled(format!("| loading {key} "), theme::warning()));
        } else if backfill.is_exhausted() {
            spans.push(Span::styled("| start of history ", theme::muted()));
        } else if backfill.is_pending() {
            spans.push(Span::styled("| backfill queued ", theme::positive()));
        }
        spans.push(Span::styled("| ?:help ", theme::muted()));
    } else {
        spans.push(Span::styled(" q:quit ", theme::muted()));
    }

    spans.push(Span::raw("| "));

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
