//! Interactive ticket sales dashboard
//!
//! Loads every weekday export once and serves the HTML dashboard plus its
//! JSON endpoints.
//!
//! Usage:
//!   ./target/release/dashboard [--port 8501] [--data-dir src/data] [--holidays FILE]
//!
//! REST endpoints:
//!   GET /                                   - Dashboard page
//!   GET /api/v1/health                      - Health check
//!   GET /api/v1/days                        - Loaded weekdays and file summaries
//!   GET /api/v1/report?day=D                - Full insight report
//!   GET /api/v1/metrics/:kind?day=D         - One report section
//!   GET /api/v1/shows?day=D&limit=N         - Show performance
//!   GET /api/v1/week-over-week?day=D        - Show-to-show changes
//!   GET /api/v1/customers/case-studies      - Notable repeat customers
//!   GET /api/v1/recommendations?day=D       - Actionable recommendations

use anyhow::{Context, Result};
use clap::Parser;
use comedy_ticket_insights::api::{create_router, InsightService};
use comedy_ticket_insights::holidays::load_calendar;
use comedy_ticket_insights::loader;
use comedy_ticket_insights::metrics::TrendGranularity;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Serve the comedy ticket insights dashboard")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "COMEDY_PORT", default_value = "8501")]
    port: u16,

    #[arg(long, env = "COMEDY_DATA_DIR", default_value = "src/data")]
    data_dir: PathBuf,

    #[arg(long, env = "COMEDY_HOLIDAYS")]
    holidays: Option<PathBuf>,

    #[arg(long, default_value = "week")]
    granularity: TrendGranularity,
}

fn print_banner(port: u16, records: usize) {
    println!("============================================================");
    println!("           COMEDY TICKET INSIGHTS DASHBOARD");
    println!("============================================================");
    println!();
    println!("  Port:      {}", port);
    println!("  Dashboard: http://localhost:{}/", port);
    println!("  API:       http://localhost:{}/api/v1/", port);
    println!("  Records:   {}", records);
    println!();
    println!("REST Endpoints:");
    println!("  GET /api/v1/health                 Health check");
    println!("  GET /api/v1/days                   Loaded days");
    println!("  GET /api/v1/report?day=            Full report");
    println!("  GET /api/v1/metrics/:kind?day=     One section");
    println!("  GET /api/v1/shows?day=&limit=      Show performance");
    println!("  GET /api/v1/week-over-week?day=    Week over week");
    println!("  GET /api/v1/customers/case-studies Case studies");
    println!("  GET /api/v1/recommendations?day=   Recommendations");
    println!();
    println!("============================================================");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .init();

    let args = Args::parse();

    let table = loader::load_all(&args.data_dir)
        .with_context(|| format!("Failed to load ticket data from {}", args.data_dir.display()))?;
    let calendar = load_calendar(args.holidays.as_deref()).context("Failed to load holiday calendar")?;

    print_banner(args.port, table.len());

    let service = Arc::new(InsightService::new(table, calendar).with_granularity(args.granularity));
    let app = create_router(service);

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!("Starting dashboard on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
