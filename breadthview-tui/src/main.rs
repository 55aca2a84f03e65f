//! BreadthView TUI: market-breadth dashboard in the terminal.
//!
//! Screens:
//! 1. Gate: email registration (skipped when `require_email = false`)
//! 2. Loading: initial window of the selected index
//! 3. Error: fatal fetch failure, `r` retries
//! 4. Dashboard: price, breadth and new highs/lows panes

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use breadthview_core::config::DashboardConfig;
use breadthview_core::data::{HttpProvider, RangeProvider, SyntheticProvider};
use breadthview_tui::app::AppState;
use breadthview_tui::worker::{self, WorkerCommand};
use breadthview_tui::{input, ui};

#[derive(Parser)]
#[command(name = "breadthview", about = "Market breadth dashboard")]
struct Args {
    /// Config file (default: <config dir>/breadthview/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the breadth API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Use generated data instead of the API
    #[arg(long)]
    synthetic: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DashboardConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let log_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("breadthview")
        .join("logs");
    let _log_guard = init_logging(&log_dir)?;

    let provider: Arc<dyn RangeProvider> = if args.synthetic {
        Arc::new(SyntheticProvider::default())
    } else {
        Arc::new(HttpProvider::new(
            &config.api_base_url,
            config.request_timeout(),
            config.max_retries,
        )?)
    };
    info!(provider = provider.name(), api = %config.api_base_url, "starting");

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(cmd_rx, resp_tx, provider)?;

    let today = chrono::Local::now().date_naive();
    let mut app = AppState::new(config, cmd_tx.clone(), resp_rx, today);
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

/// Log to a daily-rolling file; the terminal belongs to the UI.
fn init_logging(dir: &std::path::Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, "breadthview.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_worker_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Fire any due backfill
        app.tick(Instant::now());

        // 5. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}
