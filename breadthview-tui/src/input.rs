//! Keyboard input dispatch: screen → overlays → dashboard keys.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Screen};

const ZOOM_IN: f64 = 0.8;
const ZOOM_OUT: f64 = 1.25;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    handle_key_at(app, key, Instant::now());
}

pub fn handle_key_at(app: &mut AppState, key: KeyEvent, now: Instant) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // 1. Screens other than the dashboard own the whole keyboard.
    match &app.screen {
        Screen::Gate => {
            handle_gate_key(app, key);
            return;
        }
        Screen::Error(_) => {
            match key.code {
                KeyCode::Char('r') => app.retry(),
                KeyCode::Char('q') | KeyCode::Esc => app.running = false,
                _ => {}
            }
            return;
        }
        Screen::Loading | Screen::Dashboard => {}
    }

    // 2. Overlays consume input next.
    match app.overlay {
        Overlay::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.overlay = Overlay::None;
            }
            return;
        }
        Overlay::StockList => {
            handle_stock_list_key(app, key);
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 3. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Overlay::Help;
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('i') => {
            app.cycle_index();
            return;
        }
        _ => {}
    }

    if app.screen != Screen::Dashboard {
        return;
    }

    // 4. Dashboard keys.
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => {
            let step = app.pan_step();
            app.pan(-step, now);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            let step = app.pan_step();
            app.pan(step, now);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom(ZOOM_IN, now),
        KeyCode::Char('-') => app.zoom(ZOOM_OUT, now),
        KeyCode::Char(',') => app.move_crosshair(-1, now),
        KeyCode::Char('.') => app.move_crosshair(1, now),
        KeyCode::Esc => app.clear_crosshair(),
        KeyCode::Tab => app.cycle_focus(),
        KeyCode::Char(c @ '1'..='5') => {
            let slot = c as usize - '1' as usize;
            app.toggle_ma(slot);
        }
        KeyCode::Char('s') => app.open_stock_list(),
        _ => {}
    }
}

fn handle_gate_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.running = false,
        KeyCode::Enter => app.submit_email(),
        KeyCode::Backspace => {
            app.gate.input.pop();
        }
        KeyCode::Char(c) if !app.gate.submitting => {
            app.gate.input.push(c);
            app.gate.error = None;
        }
        _ => {}
    }
}

fn handle_stock_list_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('s') => {
            app.overlay = Overlay::None;
            app.stock_list = None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(list) = app.stock_list.as_mut() {
                if list.scroll + 1 < list.entries.len() {
                    list.scroll += 1;
                }
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(list) = app.stock_list.as_mut() {
                list.scroll = list.scroll.saturating_sub(1);
            }
        }
        _ => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}
