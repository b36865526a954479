//! Human readable rendering of an [`InsightReport`]

use super::{InsightReport, SectionOutcome};
use crate::metrics::customers::RepeatCustomers;
use crate::metrics::geography::Geography;
use crate::metrics::holiday_impact::HolidayImpact;
use crate::metrics::overview::Overview;
use crate::metrics::payments::PaymentPatterns;
use crate::metrics::timing::PurchaseTiming;
use crate::metrics::trends::TimeTrends;
use crate::metrics::MetricResult;
use std::fmt::{self, Display, Formatter};

pub const TOP_LOCATIONS: usize = 5;
const RECENT_PERIODS: usize = 12;
const LISTED_ANOMALIES: usize = 5;

pub fn render_console(report: &InsightReport) -> String {
    Console(report).to_string()
}

/// `Display` adapter that lays out the whole report
pub struct Console<'a>(pub &'a InsightReport);

impl Display for Console<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let label = report.filter.map_or("All days", |d| d.as_str());

        writeln!(f, "{}", "═".repeat(70))?;
        writeln!(f, "  COMEDY TICKET SALES ANALYSIS - {}", label)?;
        writeln!(f, "{}", "═".repeat(70))?;
        writeln!(f, "  Generated:  {}", report.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(
            f,
            "  Records:    {} ({} rows skipped at load)",
            fmt_count(report.total_records as u64),
            report.skipped_rows
        )?;

        for (kind, outcome) in &report.sections {
            writeln!(f)?;
            writeln!(f, "{}", kind.title())?;
            writeln!(f, "{}", "─".repeat(70))?;
            match outcome {
                SectionOutcome::Failed { error } => writeln!(f, "  Section unavailable: {}", error)?,
                SectionOutcome::Ok(result) => match result {
                    MetricResult::Overview(r) => overview(f, r)?,
                    MetricResult::TimeTrends(r) => trends(f, r)?,
                    MetricResult::PurchaseTiming(r) => timing(f, r)?,
                    MetricResult::RepeatCustomers(r) => customers(f, r)?,
                    MetricResult::Geography(r) => geography(f, r)?,
                    MetricResult::HolidayImpact(r) => holidays(f, r)?,
                    MetricResult::PaymentPatterns(r) => payments(f, r)?,
                },
            }
        }
        writeln!(f, "\n{}", "═".repeat(70))
    }
}

/// 12345 -> "12,345"
pub fn fmt_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn fmt_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, fmt_count(cents / 100), cents % 100)
}

pub fn fmt_pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

fn overview(f: &mut Formatter<'_>, r: &Overview) -> fmt::Result {
    writeln!(f, "  Total Orders:          {:>12}", fmt_count(r.total_orders as u64))?;
    writeln!(f, "  Total Tickets Sold:    {:>12}", fmt_count(r.total_tickets))?;
    writeln!(f, "  Total Revenue:         {:>12}", fmt_money(r.total_revenue))?;
    writeln!(f, "  Unique Customers:      {:>12}", fmt_count(r.unique_customers as u64))?;
    writeln!(
        f,
        "  Avg Order Value:       {:>12}",
        r.avg_order_value.map_or_else(|| "n/a".to_string(), fmt_money)
    )?;
    writeln!(f, "  Avg Tickets / Order:   {:>12}", fmt_opt(r.avg_tickets_per_order, 2))?;
    if !r.orders_by_day.is_empty() {
        writeln!(f, "\n  {:12} {:>10}", "Show Day", "Orders")?;
        for (day, orders) in &r.orders_by_day {
            writeln!(f, "  {:12} {:>10}", day.as_str(), fmt_count(*orders as u64))?;
        }
    }
    Ok(())
}

fn trends(f: &mut Formatter<'_>, r: &TimeTrends) -> fmt::Result {
    writeln!(f, "  Granularity: {}   Periods: {}", r.granularity, r.series.len())?;
    if let Some(hour) = r.peak_hour {
        writeln!(f, "  Peak purchase hour: {:02}:00 ({} orders)", hour, r.hourly_orders[hour as usize])?;
    }

    if !r.series.is_empty() {
        writeln!(
            f,
            "\n  {:12} {:>8} {:>8} {:>10} {:>14}",
            "Period", "Orders", "Tickets", "Customers", "Revenue"
        )?;
        writeln!(f, "  {}", "─".repeat(56))?;
        let skip = r.series.len().saturating_sub(RECENT_PERIODS);
        for point in &r.series[skip..] {
            writeln!(
                f,
                "  {:12} {:>8} {:>8} {:>10} {:>14}",
                point.period,
                point.totals.orders,
                point.totals.tickets,
                point.unique_customers,
                fmt_money(point.totals.revenue)
            )?;
        }
    }

    writeln!(f, "\n  Anomalous purchase days ({}): {}", r.metric, r.anomalies.len())?;
    for day in r.anomalies.iter().take(LISTED_ANOMALIES) {
        writeln!(f, "    {}  {:>10.1}  (z = {:+.2})", day.date, day.value, day.z_score)?;
    }

    let heatmap = &r.weekly_heatmap;
    if !heatmap.rows.is_empty() {
        write!(f, "\n  {:10}", "Order week")?;
        for day in &heatmap.days {
            write!(f, " {:>6}", &day.as_str()[..3])?;
        }
        writeln!(f)?;
        let skip = heatmap.rows.len().saturating_sub(RECENT_PERIODS);
        for row in &heatmap.rows[skip..] {
            write!(f, "  {:10}", row.week)?;
            for orders in &row.orders {
                write!(f, " {:>6}", orders)?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}

fn timing(f: &mut Formatter<'_>, r: &PurchaseTiming) -> fmt::Result {
    let of_total = |n: usize| fmt_pct(crate::metrics::ratio(n as f64, r.total_orders as f64));
    writeln!(f, "  Avg days before show:  {:>10}", fmt_opt(r.avg_lead_days, 1))?;
    writeln!(f, "  Same-day purchases:    {:>10} ({})", r.same_day, of_total(r.same_day))?;
    writeln!(f, "  Last minute (0-1d):    {:>10} ({})", r.last_minute, of_total(r.last_minute))?;
    writeln!(f, "  Advance (7d+):         {:>10} ({})", r.advance, of_total(r.advance))?;

    writeln!(f, "\n  {:12} {:>8} {:>8}", "Lead Time", "Orders", "Share")?;
    writeln!(f, "  {}", "─".repeat(30))?;
    for bucket in &r.buckets {
        writeln!(f, "  {:12} {:>8} {:>8}", bucket.label, bucket.totals.orders, fmt_pct(bucket.share))?;
    }
    if r.after_show > 0 {
        writeln!(f, "  Bought after the show date: {}", r.after_show)?;
    }
    Ok(())
}

fn customers(f: &mut Formatter<'_>, r: &RepeatCustomers) -> fmt::Result {
    writeln!(f, "  Total Customers:       {:>12}", fmt_count(r.total_customers as u64))?;
    writeln!(f, "  First-time:            {:>12}", fmt_count(r.first_time_customers as u64))?;
    writeln!(f, "  Repeat:                {:>12}", fmt_count(r.repeat_customers as u64))?;
    writeln!(f, "  Repeat Rate:           {:>12}", fmt_pct(r.repeat_rate))?;
    writeln!(f, "  Orders per Customer:   {:>12}", fmt_opt(r.avg_orders_per_customer, 2))?;
    writeln!(f, "  First-time Revenue:    {:>12}", fmt_money(r.first_time_revenue))?;
    writeln!(
        f,
        "  Repeat Revenue:        {:>12} ({} of total)",
        fmt_money(r.repeat_revenue),
        fmt_pct(r.repeat_revenue_share)
    )
}

fn geography(f: &mut Formatter<'_>, r: &Geography) -> fmt::Result {
    writeln!(f, "  {:28} {:>8} {:>8}", "Top Locations", "Tickets", "Share")?;
    writeln!(f, "  {}", "─".repeat(46))?;
    for loc in r.locations.iter().take(TOP_LOCATIONS) {
        let name = format!("{}, {}", loc.city, loc.state);
        writeln!(f, "  {:28} {:>8} {:>8}", name, loc.totals.tickets, fmt_pct(loc.ticket_share))?;
    }

    writeln!(f, "\n  {:28} {:>8} {:>8}", "Top States", "Tickets", "Share")?;
    writeln!(f, "  {}", "─".repeat(46))?;
    for state in r.states.iter().take(TOP_LOCATIONS) {
        writeln!(f, "  {:28} {:>8} {:>8}", state.state, state.totals.tickets, fmt_pct(state.ticket_share))?;
    }
    Ok(())
}

fn holidays(f: &mut Formatter<'_>, r: &HolidayImpact) -> fmt::Result {
    writeln!(
        f,
        "  Holiday shows: {:>4}   avg tickets {:>8}",
        r.holiday_shows,
        fmt_opt(r.holiday_mean_tickets, 1)
    )?;
    writeln!(
        f,
        "  Regular shows: {:>4}   avg tickets {:>8}",
        r.regular_shows,
        fmt_opt(r.regular_mean_tickets, 1)
    )?;
    if let Some(lift) = r.lift {
        writeln!(f, "  Holiday lift: {:+.1}%", (lift - 1.0) * 100.0)?;
    }
    for show in &r.holidays {
        writeln!(
            f,
            "    {} {:9} {:30} {:>5} tickets",
            show.date,
            show.weekday.as_str(),
            show.holiday,
            show.totals.tickets
        )?;
    }
    Ok(())
}

fn payments(f: &mut Formatter<'_>, r: &PaymentPatterns) -> fmt::Result {
    writeln!(f, "  {:20} {:>8} {:>8} {:>14}", "Payment Type", "Orders", "Share", "Revenue")?;
    writeln!(f, "  {}", "─".repeat(53))?;
    for method in &r.by_method {
        writeln!(
            f,
            "  {:20} {:>8} {:>8} {:>14}",
            method.method,
            method.totals.orders,
            fmt_pct(method.order_share),
            fmt_money(method.totals.revenue)
        )?;
    }
    writeln!(f, "  Free orders: {}", fmt_pct(r.free_order_rate))?;

    writeln!(f, "\n  {:20} {:>8} {:>8}", "Tickets per Order", "Orders", "Share")?;
    writeln!(f, "  {}", "─".repeat(38))?;
    for q in &r.by_quantity {
        writeln!(f, "  {:20} {:>8} {:>8}", q.quantity, q.totals.orders, fmt_pct(q.order_share))?;
    }
    Ok(())
}
