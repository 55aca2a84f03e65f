//! BreadthView CLI: fetch, indicator and drill-down commands.
//!
//! Commands:
//! - `fetch`: fetch one range and report per-series bar counts
//! - `indicators`: initial window plus backfills through a dashboard
//!   session, print the latest rows and export CSV
//! - `above-ma50`: constituents above their 50-day average on a date
//! - `subscribe`: register an email with the API gate

mod export;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use breadthview_core::adapter::ChartAdapter;
use breadthview_core::config::DashboardConfig;
use breadthview_core::data::{validate_email, HttpProvider, RangeProvider, SyntheticProvider};
use breadthview_core::domain::{Bar, RangeKey};
use breadthview_core::fingerprint::{dataset_fingerprint, indicator_fingerprint};
use breadthview_core::indicators::IndicatorParams;
use breadthview_core::session::{DashboardSession, FetchKind, FetchRequest, SessionEvent};

#[derive(Parser)]
#[command(name = "breadthview-cli", about = "BreadthView CLI: market breadth indicators")]
struct Cli {
    /// Config file (default: <config dir>/breadthview/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the breadth API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one range and print per-series bar counts and spans.
    Fetch {
        /// Index symbol (e.g., HK.800000). Defaults to the configured index.
        #[arg(long)]
        index: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to one window before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Use generated data instead of the API.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Load a window plus N backfills and compute every indicator.
    Indicators {
        #[arg(long)]
        index: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        /// Number of one-year backfills after the initial window.
        #[arg(long, default_value_t = 0)]
        backfill: usize,

        /// Moving average periods, comma separated (e.g., 5,10,20).
        #[arg(long, value_delimiter = ',')]
        ma: Option<Vec<usize>>,

        /// Rows to print from the end of the series.
        #[arg(long, default_value_t = 10)]
        tail: usize,

        /// Write every row to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// List constituents closing above their 50-day average on a date.
    #[command(name = "above-ma50")]
    AboveMa50 {
        #[arg(long)]
        index: Option<String>,

        /// Trading date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Register an email address with the API gate.
    Subscribe {
        #[arg(long)]
        email: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    match cli.command {
        Commands::Fetch {
            index,
            start,
            end,
            synthetic,
        } => run_fetch(&config, index, start, end, synthetic),
        Commands::Indicators {
            index,
            start,
            end,
            backfill,
            ma,
            tail,
            csv,
            synthetic,
        } => run_indicators(
            &config,
            IndicatorsArgs {
                index,
                start,
                end,
                backfill,
                ma,
                tail,
                csv,
                synthetic,
            },
        ),
        Commands::AboveMa50 {
            index,
            date,
            json,
            synthetic,
        } => run_above_ma50(&config, index, &date, json, synthetic),
        Commands::Subscribe { email } => run_subscribe(&config, &email),
    }
}

fn make_provider(config: &DashboardConfig, synthetic: bool) -> Result<Box<dyn RangeProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::default()));
    }
    Ok(Box::new(HttpProvider::new(
        &config.api_base_url,
        config.request_timeout(),
        config.max_retries,
    )?))
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'")))
        .transpose()
}

/// `[start, end]` from the flags, defaulting to the configured trailing window.
fn resolve_window(config: &DashboardConfig, start: Option<String>, end: Option<String>) -> Result<RangeKey> {
    let end = parse_date(end.as_deref())?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let key = match parse_date(start.as_deref())? {
        Some(start) => RangeKey::new(start, end),
        None => RangeKey::trailing(end, config.initial_window_days)
            .with_context(|| format!("a {}-day window before {end} is out of range", config.initial_window_days))?,
    };
    if !key.is_ordered() {
        bail!("--start {} is after --end {}", key.start, key.end);
    }
    Ok(key)
}

fn span(bars: &[Bar]) -> String {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => "(empty)".into(),
    }
}

fn run_fetch(
    config: &DashboardConfig,
    index: Option<String>,
    start: Option<String>,
    end: Option<String>,
    synthetic: bool,
) -> Result<()> {
    let index = index.unwrap_or_else(|| config.default_index.clone());
    let key = resolve_window(config, start, end)?;
    let provider = make_provider(config, synthetic)?;

    info!(provider = provider.name(), %index, range = %key, "fetching");
    let range = provider.fetch_range(&index, key)?;

    println!("Index: {} ({})", config.index_name(&index), index);
    println!("Range: {}", range.key);
    println!("Bars:  {} total", range.bar_count());
    println!();
    println!("{:<12} {:>6}  {}", "Series", "Bars", "Span");
    println!("{}", "-".repeat(44));
    println!("{:<12} {:>6}  {}", index, range.index.len(), span(&range.index));
    for (symbol, bars) in &range.constituents {
        println!("{:<12} {:>6}  {}", symbol, bars.len(), span(bars));
    }
    Ok(())
}

struct IndicatorsArgs {
    index: Option<String>,
    start: Option<String>,
    end: Option<String>,
    backfill: usize,
    ma: Option<Vec<usize>>,
    tail: usize,
    csv: Option<PathBuf>,
    synthetic: bool,
}

fn run_indicators(config: &DashboardConfig, args: IndicatorsArgs) -> Result<()> {
    let index = args.index.unwrap_or_else(|| config.default_index.clone());
    let key = resolve_window(config, args.start, args.end)?;
    let params = match args.ma {
        Some(periods) => IndicatorParams {
            ma_periods: periods,
            ..config.indicators.clone()
        },
        None => config.indicators.clone(),
    };
    if let Err(reason) = params.validate() {
        bail!("invalid indicator parameters: {reason}");
    }

    let provider = make_provider(config, args.synthetic)?;
    let window_days = (key.end - key.start).num_days();
    let mut session = DashboardSession::new(params, Duration::ZERO, window_days);

    let request = session.select_index(&index, key.end);
    run_request(&mut session, provider.as_ref(), request)?;
    for _ in 0..args.backfill {
        let Some(request) = session.request_backfill() else {
            info!("no earlier history");
            break;
        };
        if !run_request(&mut session, provider.as_ref(), request)? {
            break;
        }
    }

    let merged = session.merged();
    let indicators = session.indicators();
    let frame = ChartAdapter::from_config(config).render(&merged, &indicators);

    println!(
        "{} ({}): {} bars, {} constituents, {} ranges",
        config.index_name(&index),
        index,
        merged.len(),
        merged.constituents.len(),
        session.store().len()
    );
    println!();
    print_tail(&merged.index, &indicators, args.tail);
    println!();
    println!("Dataset fingerprint:   {}", dataset_fingerprint(&merged).short());
    println!("Indicator fingerprint: {}", indicator_fingerprint(&indicators).short());

    if let Some(path) = args.csv {
        let rows = export::export_csv(&path, &merged, &indicators, &frame)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    Ok(())
}

/// Fetch `request` and feed it to the session. Returns false when a
/// backfill failed; an initial fetch failure is an error.
fn run_request(session: &mut DashboardSession, provider: &dyn RangeProvider, request: FetchRequest) -> Result<bool> {
    let result = provider.fetch_range(&request.index, request.key);
    for event in session.complete(request, result) {
        match event {
            SessionEvent::RangeMerged {
                request,
                merged,
                prepended,
                total_bars,
            } => {
                info!(
                    range = %request.key,
                    prepended,
                    total_bars,
                    symbols = merged.constituents.len(),
                    "merged"
                );
            }
            SessionEvent::FetchFailed {
                request,
                error,
                fatal,
            } => {
                if fatal {
                    bail!("fetching {} failed: {error}", request.key);
                }
                warn!(range = %request.key, %error, "backfill failed");
                return Ok(false);
            }
            SessionEvent::MergeRejected { request, reason } => {
                if request.kind == FetchKind::Initial {
                    bail!("range {} rejected: {reason}", request.key);
                }
                warn!(range = %request.key, %reason, "backfill rejected");
                return Ok(false);
            }
            SessionEvent::IndicatorsReady(_)
            | SessionEvent::BackfillNeeded(_)
            | SessionEvent::StaleDropped(_) => {}
        }
    }
    Ok(true)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".into(),
    }
}

fn print_tail(index: &[Bar], indicators: &breadthview_core::IndicatorSeries, tail: usize) {
    let start = index.len().saturating_sub(tail);

    let mut header = format!("{:<10} {:>10}", "Date", "Close");
    for period in indicators.ma.keys() {
        header.push_str(&format!(" {:>10}", format!("MA{period}")));
    }
    header.push_str(&format!(" {:>8} {:>5} {:>5} {:>6}", "Breadth", "NH", "NL", "Net"));
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for (i, bar) in index.iter().enumerate().skip(start) {
        let mut line = format!("{:<10} {:>10.2}", bar.date, bar.close);
        for values in indicators.ma.values() {
            line.push_str(&format!(" {:>10}", fmt_opt(values[i], 2)));
        }
        line.push_str(&format!(
            " {:>8} {:>5} {:>5} {:>+6}",
            fmt_opt(indicators.breadth[i], 3),
            indicators.new_highs[i],
            indicators.new_lows[i],
            indicators.net_high_low[i]
        ));
        println!("{line}");
    }
}

fn run_above_ma50(
    config: &DashboardConfig,
    index: Option<String>,
    date: &str,
    json: bool,
    synthetic: bool,
) -> Result<()> {
    let index = index.unwrap_or_else(|| config.default_index.clone());
    let Some(date) = parse_date(Some(date))? else {
        bail!("--date is required");
    };
    let provider = make_provider(config, synthetic)?;
    let stocks = provider.above_ma50(&index, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stocks)?);
        return Ok(());
    }
    println!("{} ({}) on {}: {} above MA50", config.index_name(&index), index, date, stocks.len());
    println!();
    for stock in &stocks {
        println!("{:<10} {}", stock.stock_code, stock.stock_name);
    }
    Ok(())
}

fn run_subscribe(config: &DashboardConfig, email: &str) -> Result<()> {
    validate_email(email)?;
    let provider = make_provider(config, false)?;
    provider.submit_email(email)?;
    println!("Subscribed {email}");
    Ok(())
}
