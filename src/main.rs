//! Basic ticket sales analysis
//!
//! Loads the weekday CSV exports, prints the insight report and writes the
//! same results as JSON.
//!
//! Usage:
//!   ./target/release/comedy_insights [--day Friday] [--data-dir src/data]
//!       [--metric revenue] [--smoothing exponential --alpha 0.3]

use anyhow::{Context, Result};
use clap::Parser;
use comedy_ticket_insights::holidays::load_calendar;
use comedy_ticket_insights::metrics::{AnalysisContext, Smoothing, TrendGranularity, TrendMetric};
use comedy_ticket_insights::models::Weekday;
use comedy_ticket_insights::{loader, report};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "comedy_insights")]
#[command(about = "Analyze comedy show ticket sales by show day")]
struct Args {
    /// Only analyze one show day (Monday..Saturday)
    #[arg(long)]
    day: Option<Weekday>,

    /// Directory holding Monday.csv .. Saturday.csv
    #[arg(long, env = "COMEDY_DATA_DIR", default_value = "src/data")]
    data_dir: PathBuf,

    /// JSON results path
    #[arg(long, default_value = "analysis_results.json")]
    output: PathBuf,

    /// Holiday list (one YYYY-MM-DD[,name] per line) instead of US federal holidays
    #[arg(long, env = "COMEDY_HOLIDAYS")]
    holidays: Option<PathBuf>,

    /// Period size for the sales-over-time series
    #[arg(long, default_value = "day")]
    granularity: TrendGranularity,

    /// Daily value that is smoothed and checked for anomalies
    #[arg(long, default_value = "orders")]
    metric: TrendMetric,

    /// rolling, exponential or none
    #[arg(long, default_value = "rolling")]
    smoothing: String,

    /// Rolling window in days (default 7)
    #[arg(long)]
    window: Option<usize>,

    /// Exponential smoothing factor in (0, 1] (default 0.3)
    #[arg(long)]
    alpha: Option<f64>,

    /// Print the report without writing JSON
    #[arg(long)]
    no_json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let table = match args.day {
        Some(day) => loader::load_weekdays(&args.data_dir, &[day]),
        None => loader::load_all(&args.data_dir),
    }
    .with_context(|| format!("Failed to load ticket data from {}", args.data_dir.display()))?;

    if table.is_empty() {
        warn!("No ticket sales loaded; every section will be empty");
    }
    info!("Loaded {} sales ({} rows skipped)", table.len(), table.skipped_rows());

    let smoothing = Smoothing::from_params(&args.smoothing, args.window, args.alpha)?;
    let calendar = load_calendar(args.holidays.as_deref()).context("Failed to load holiday calendar")?;
    let ctx = AnalysisContext::new(&table, calendar.as_ref())
        .with_filter(args.day)
        .with_granularity(args.granularity)
        .with_trend_metric(args.metric)
        .with_smoothing(smoothing);

    let insights = report::build_report(&ctx);
    println!("{}", report::render_console(&insights));

    if !args.no_json {
        insights
            .write_json(&args.output)
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
    }

    let failed = insights.failed_sections();
    if !failed.is_empty() {
        warn!("{} section(s) could not be computed: {:?}", failed.len(), failed);
    }

    Ok(())
}
