//! Dashboard palette and style helpers.
//!
//! Candles and histograms use the teal/red pair of the web charts; moving
//! averages keep their per-period colors so an MA toggled off and on again
//! comes back in the same color.

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 200, 255);
pub const RISING: Color = Color::Rgb(38, 166, 154);
pub const FALLING: Color = Color::Rgb(239, 83, 80);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const CROSSHAIR: Color = Color::Rgb(155, 125, 255);
pub const MUTED: Color = Color::Rgb(120, 130, 150);
pub const BREADTH_LINE: Color = Color::Rgb(41, 98, 255);

/// Color of the MA overlay for `period`.
pub fn ma_color(period: usize) -> Color {
    match period {
        5 => Color::Rgb(255, 64, 64),
        10 => Color::Rgb(64, 220, 64),
        20 => Color::Rgb(80, 120, 255),
        50 => Color::Rgb(255, 165, 0),
        200 => Color::Rgb(186, 85, 211),
        _ => Color::Rgb(200, 200, 200),
    }
}

/// Rising/falling color for a histogram bar or candle.
pub fn direction_color(rising: bool) -> Color {
    if rising {
        RISING
    } else {
        FALLING
    }
}

pub fn direction_style(rising: bool) -> Style {
    Style::default().fg(direction_color(rising))
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(FALLING)
}

pub fn positive() -> Style {
    Style::default().fg(RISING)
}

/// Border of a pane; the focused pane is highlighted.
pub fn pane_border(focused: bool) -> Style {
    if focused {
        accent()
    } else {
        muted()
    }
}

pub fn pane_title(focused: bool) -> Style {
    if focused {
        accent_bold()
    } else {
        muted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_periods_have_distinct_colors() {
        let colors: Vec<Color> = [5, 10, 20, 50, 200].iter().map(|&p| ma_color(p)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn direction_colors() {
        assert_eq!(direction_color(true), RISING);
        assert_eq!(direction_color(false), FALLING);
        assert_eq!(pane_border(true), accent());
    }
}
