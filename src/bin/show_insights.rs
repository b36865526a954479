//! Show-level insights - which shows sell, who keeps coming back, and
//! what showrunners can change
//!
//! Run: ./target/release/show_insights [section] [--day Friday]
//! Sections: all, shows, weekly, customers, controllable, recommendations

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comedy_ticket_insights::holidays::UsFederalHolidays;
use comedy_ticket_insights::loader;
use comedy_ticket_insights::metrics::customers::CustomerProfile;
use comedy_ticket_insights::metrics::shows::{self, ShowAnalysis};
use comedy_ticket_insights::metrics::{customers, payments, timing, AnalysisContext};
use comedy_ticket_insights::models::Weekday;
use comedy_ticket_insights::report::console::{fmt_count, fmt_money, fmt_pct};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const TOP_SHOWS: usize = 10;
const CASE_MIN_ORDERS: usize = 3;
const CASE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    All,
    Shows,
    Weekly,
    Customers,
    Controllable,
    Recommendations,
}

#[derive(Parser, Debug)]
#[command(name = "show_insights")]
#[command(about = "Show-level comedy ticket insights")]
struct Args {
    #[arg(value_enum, default_value = "all")]
    section: Section,

    /// Only analyze one show day (Monday..Saturday)
    #[arg(long)]
    day: Option<Weekday>,

    #[arg(long, env = "COMEDY_DATA_DIR", default_value = "src/data")]
    data_dir: PathBuf,

    /// Detailed JSON output path
    #[arg(long, default_value = "detailed_show_analysis.json")]
    output: PathBuf,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(70));
    println!("  {}", title);
    println!("{}\n", "═".repeat(70));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
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

    let calendar = UsFederalHolidays;
    let ctx = AnalysisContext::new(&table, &calendar).with_filter(args.day);
    let analysis = shows::analyze(&ctx, CASE_MIN_ORDERS, CASE_LIMIT);

    println!("\n{}", "█".repeat(70));
    println!("  SHOW-LEVEL COMEDY INSIGHTS - {}", ctx.filter_label());
    println!("{}", "█".repeat(70));

    match args.section {
        Section::All => {
            run_shows_section(&analysis);
            run_weekly_section(&analysis);
            run_customers_section(&analysis);
            run_controllable_section(&ctx, &analysis);
            run_recommendations_section(&analysis);
        }
        Section::Shows => run_shows_section(&analysis),
        Section::Weekly => run_weekly_section(&analysis),
        Section::Customers => run_customers_section(&analysis),
        Section::Controllable => run_controllable_section(&ctx, &analysis),
        Section::Recommendations => run_recommendations_section(&analysis),
    }

    analysis
        .write_json(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!("\n{}", "█".repeat(70));
    Ok(())
}

fn run_shows_section(analysis: &ShowAnalysis) {
    print_section_header("1. INDIVIDUAL SHOW PERFORMANCE");

    println!(
        "  {:10} {:9} {:>7} {:>8} {:>12} {:>9} {:>7} {:>6}",
        "Date", "Day", "Orders", "Tickets", "Revenue", "Same-day", "Free", "Top"
    );
    println!("  {}", "─".repeat(76));
    for show in analysis.individual_shows.iter().take(TOP_SHOWS) {
        println!(
            "  {:10} {:9} {:>7} {:>8} {:>12} {:>9} {:>7} {:>6}",
            show.date.to_string(),
            show.weekday.as_str(),
            show.totals.orders,
            show.totals.tickets,
            fmt_money(show.totals.revenue),
            fmt_pct(show.same_day_rate),
            fmt_pct(show.free_rate),
            show.top_state.as_deref().unwrap_or("-")
        );
    }
    println!("\n  {} shows analyzed", analysis.individual_shows.len());
}

fn run_weekly_section(analysis: &ShowAnalysis) {
    print_section_header("2. WEEK-OVER-WEEK TRENDS");

    for trend in &analysis.week_over_week {
        print_subsection(trend.weekday.as_str());
        println!(
            "  Avg order growth: {:>8}   Avg revenue growth: {:>8}",
            trend.avg_order_growth_pct.map_or_else(|| "n/a".to_string(), |g| format!("{:+.1}%", g)),
            trend.avg_revenue_growth_pct.map_or_else(|| "n/a".to_string(), |g| format!("{:+.1}%", g))
        );
        let skip = trend.shows.len().saturating_sub(5);
        for point in &trend.shows[skip..] {
            println!(
                "    {}  {:>5} orders {:>12}  {}",
                point.date,
                point.totals.orders,
                fmt_money(point.totals.revenue),
                point
                    .orders_change_pct
                    .map_or_else(String::new, |c| format!("({:+.1}% orders)", c))
            );
        }
    }
}

fn print_profiles(title: &str, profiles: &[CustomerProfile]) {
    print_subsection(title);
    for (i, p) in profiles.iter().enumerate() {
        println!(
            "  {}. {:32} {:>3} orders {:>4} tickets {:>11}  {} to {}  {}",
            i + 1,
            p.customer_id,
            p.orders,
            p.tickets,
            fmt_money(p.spent),
            p.first_show,
            p.last_show,
            p.location.label()
        );
    }
}

fn run_customers_section(analysis: &ShowAnalysis) {
    print_section_header("3. REPEAT CUSTOMER CASE STUDIES");

    let cases = &analysis.case_studies;
    println!(
        "  Customers with {}+ orders: {}",
        cases.min_orders,
        fmt_count(cases.qualifying_customers as u64)
    );
    print_profiles("Highest spenders", &cases.highest_spenders);
    print_profiles("Most frequent", &cases.most_frequent);
    print_profiles("Longest relationship", &cases.longest_relationship);
    print_profiles("Most diverse attendance", &cases.most_diverse_attendance);
    print_profiles("Highest average order", &cases.highest_avg_order);
}

fn run_controllable_section(ctx: &AnalysisContext<'_>, analysis: &ShowAnalysis) {
    print_section_header("4. CONTROLLABLE VARIABLES FOR SHOWRUNNERS");

    print_subsection("Day of week performance");
    for day in &analysis.day_performance {
        println!(
            "  {:10} {:>6.1} avg orders/show  {:>10} avg revenue/show  ({} shows)",
            day.weekday.as_str(),
            day.avg_orders_per_show.unwrap_or(0.0),
            day.avg_revenue_per_show.map_or_else(|| "n/a".to_string(), fmt_money),
            day.shows
        );
    }

    print_subsection("Pricing");
    let pay = payments::compute(ctx);
    for method in &pay.by_method {
        let avg = comedy_ticket_insights::metrics::ratio(method.totals.revenue, method.totals.orders as f64);
        println!(
            "  {:20} {:>8} orders ({:>6})  avg {}",
            method.method,
            fmt_count(method.totals.orders as u64),
            fmt_pct(method.order_share),
            avg.map_or_else(|| "n/a".to_string(), fmt_money)
        );
    }

    print_subsection("Booking windows");
    let booking = timing::compute(ctx);
    for bucket in &booking.buckets {
        println!(
            "  {:12} {:>8} orders ({:>6})  {}",
            bucket.label,
            fmt_count(bucket.totals.orders as u64),
            fmt_pct(bucket.share),
            fmt_money(bucket.totals.revenue)
        );
    }

    print_subsection("Acquisition vs retention");
    let repeat = customers::compute(ctx);
    println!(
        "  New customers:       {:>8}   revenue {}",
        fmt_count(repeat.first_time_customers as u64),
        fmt_money(repeat.first_time_revenue)
    );
    println!(
        "  Returning customers: {:>8}   revenue {} ({} of total)",
        fmt_count(repeat.repeat_customers as u64),
        fmt_money(repeat.repeat_revenue),
        fmt_pct(repeat.repeat_revenue_share)
    );

    print_subsection("Seasonality");
    for month in &analysis.seasonal {
        println!(
            "  {:10} {:>8} orders {:>8} tickets {:>12}",
            month.name,
            fmt_count(month.totals.orders as u64),
            fmt_count(month.totals.tickets),
            fmt_money(month.totals.revenue)
        );
    }
}

fn run_recommendations_section(analysis: &ShowAnalysis) {
    print_section_header("5. ACTIONABLE RECOMMENDATIONS");
    if analysis.recommendations.is_empty() {
        println!("  Not enough data for recommendations");
    }
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }
}
