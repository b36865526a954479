//! Show-level analysis: individual shows, week-over-week trends,
//! repeat-customer case studies and the levers a showrunner controls.

use super::customers::{self, CustomerProfile};
use super::{mean, ratio, AnalysisContext, Totals};
use crate::error::CalculationError;
use crate::models::{TicketSale, Weekday};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Free or same-day share above this triggers a recommendation
pub const ATTENTION_SHARE: f64 = 0.15;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowMetrics {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub event_name: Option<String>,
    #[serde(flatten)]
    pub totals: Totals,
    pub unique_customers: usize,
    pub avg_order_value: Option<f64>,
    pub tickets_per_order: Option<f64>,
    pub avg_lead_days: Option<f64>,
    pub same_day_rate: Option<f64>,
    pub advance_rate: Option<f64>,
    pub free_rate: Option<f64>,
    /// Buyers with more than one order for this show
    pub multi_order_customers: usize,
    pub top_state: Option<String>,
    pub top_state_share: Option<f64>,
}

fn group_by_show<'a>(ctx: &AnalysisContext<'a>) -> BTreeMap<NaiveDate, Vec<&'a TicketSale>> {
    let mut shows: BTreeMap<NaiveDate, Vec<&TicketSale>> = BTreeMap::new();
    for sale in ctx.rows() {
        shows.entry(sale.show_date).or_default().push(sale);
    }
    shows
}

fn show_metrics(date: NaiveDate, sales: &[&TicketSale]) -> ShowMetrics {
    let totals = Totals::of(sales.iter().copied());
    let orders = totals.orders as f64;

    let mut per_customer: HashMap<&str, usize> = HashMap::new();
    let mut per_state: HashMap<&str, usize> = HashMap::new();
    for sale in sales {
        if let Some(id) = sale.customer_id.as_deref() {
            *per_customer.entry(id).or_insert(0) += 1;
        }
        *per_state.entry(sale.location.state.as_str()).or_insert(0) += 1;
    }

    let top_state = per_state
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)));

    let leads: Vec<f64> = sales.iter().map(|s| s.lead_days() as f64).collect();
    let rate = |pred: fn(&TicketSale) -> bool| {
        ratio(sales.iter().filter(|s| pred(**s)).count() as f64, orders)
    };

    ShowMetrics {
        date,
        weekday: sales[0].show_weekday,
        event_name: sales.iter().find_map(|s| s.event_name.clone()),
        unique_customers: per_customer.len(),
        avg_order_value: ratio(totals.revenue, orders),
        tickets_per_order: ratio(totals.tickets as f64, orders),
        avg_lead_days: mean(&leads),
        same_day_rate: rate(|s| s.lead_days() == 0),
        advance_rate: rate(|s| s.lead_days() >= 7),
        free_rate: rate(|s| s.is_free()),
        multi_order_customers: per_customer.values().filter(|c| **c > 1).count(),
        top_state: top_state.map(|(state, _)| state.to_string()),
        top_state_share: top_state.and_then(|(_, n)| ratio(n as f64, orders)),
        totals,
    }
}

/// One entry per show, most orders first
pub fn show_performance(ctx: &AnalysisContext<'_>) -> Vec<ShowMetrics> {
    let mut shows: Vec<ShowMetrics> = group_by_show(ctx)
        .into_iter()
        .map(|(date, sales)| show_metrics(date, &sales))
        .collect();
    shows.sort_by(|a, b| {
        b.totals
            .orders
            .cmp(&a.totals.orders)
            .then_with(|| a.date.cmp(&b.date))
    });
    shows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverWeekPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Totals,
    pub orders_change_pct: Option<f64>,
    pub revenue_change_pct: Option<f64>,
    pub tickets_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayTrend {
    pub weekday: Weekday,
    pub shows: Vec<WeekOverWeekPoint>,
    pub avg_order_growth_pct: Option<f64>,
    pub avg_revenue_growth_pct: Option<f64>,
}

/// Percent change from `prev` to `cur`; `None` when `prev` is zero
pub fn pct_change(prev: f64, cur: f64) -> Option<f64> {
    ratio(cur - prev, prev).map(|r| r * 100.0)
}

/// Show-to-show changes for every weekday present, in date order
pub fn week_over_week(ctx: &AnalysisContext<'_>) -> Vec<WeekdayTrend> {
    let mut by_day: BTreeMap<Weekday, BTreeMap<NaiveDate, Totals>> = BTreeMap::new();
    for sale in ctx.rows() {
        by_day
            .entry(sale.show_weekday)
            .or_default()
            .entry(sale.show_date)
            .or_default()
            .add(sale);
    }

    by_day
        .into_iter()
        .map(|(weekday, shows)| {
            let mut prev: Option<Totals> = None;
            let points: Vec<WeekOverWeekPoint> = shows
                .into_iter()
                .map(|(date, totals)| {
                    let change = |f: fn(&Totals) -> f64| prev.as_ref().and_then(|p| pct_change(f(p), f(&totals)));
                    let point = WeekOverWeekPoint {
                        date,
                        orders_change_pct: change(|t| t.orders as f64),
                        revenue_change_pct: change(|t| t.revenue),
                        tickets_change_pct: change(|t| t.tickets as f64),
                        totals,
                    };
                    prev = Some(totals);
                    point
                })
                .collect();

            let growth = |f: fn(&WeekOverWeekPoint) -> Option<f64>| {
                let values: Vec<f64> = points.iter().filter_map(f).collect();
                mean(&values)
            };
            WeekdayTrend {
                weekday,
                avg_order_growth_pct: growth(|p| p.orders_change_pct),
                avg_revenue_growth_pct: growth(|p| p.revenue_change_pct),
                shows: points,
            }
        })
        .collect()
}

/// Which end of the spending range the lifecycle view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendOrder {
    #[default]
    Top,
    Bottom,
}

impl FromStr for SpendOrder {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(SpendOrder::Top),
            "bottom" => Ok(SpendOrder::Bottom),
            other => Err(CalculationError::InvalidInput(format!(
                "Unknown order '{}' (top, bottom)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStudies {
    pub min_orders: usize,
    pub qualifying_customers: usize,
    pub highest_spenders: Vec<CustomerProfile>,
    pub most_frequent: Vec<CustomerProfile>,
    pub longest_relationship: Vec<CustomerProfile>,
    pub most_diverse_attendance: Vec<CustomerProfile>,
    pub highest_avg_order: Vec<CustomerProfile>,
    pub lifecycle_order: SpendOrder,
    /// First to last show of the top or bottom spenders
    pub lifecycle: Vec<CustomerProfile>,
}

fn top_by<F>(profiles: &[CustomerProfile], limit: usize, mut cmp: F) -> Vec<CustomerProfile>
where
    F: FnMut(&CustomerProfile, &CustomerProfile) -> Ordering,
{
    let mut sorted = profiles.to_vec();
    // profiles arrive sorted by id, so a stable sort keeps ties deterministic
    sorted.sort_by(|a, b| cmp(b, a));
    sorted.truncate(limit);
    sorted
}

fn by_spend(profiles: &[CustomerProfile], limit: usize, order: SpendOrder) -> Vec<CustomerProfile> {
    match order {
        SpendOrder::Top => top_by(profiles, limit, |a, b| a.spent.total_cmp(&b.spent)),
        SpendOrder::Bottom => {
            let mut sorted = profiles.to_vec();
            sorted.sort_by(|a, b| a.spent.total_cmp(&b.spent));
            sorted.truncate(limit);
            sorted
        }
    }
}

/// Notable customers with at least `min_orders` orders
pub fn customer_case_studies(
    ctx: &AnalysisContext<'_>,
    min_orders: usize,
    limit: usize,
    order: SpendOrder,
) -> CaseStudies {
    let regulars: Vec<CustomerProfile> = customers::customer_profiles(ctx)
        .into_iter()
        .filter(|p| p.orders >= min_orders)
        .collect();

    CaseStudies {
        min_orders,
        qualifying_customers: regulars.len(),
        highest_spenders: by_spend(&regulars, limit, SpendOrder::Top),
        most_frequent: top_by(&regulars, limit, |a, b| a.orders.cmp(&b.orders)),
        longest_relationship: top_by(&regulars, limit, |a, b| a.lifetime_days().cmp(&b.lifetime_days())),
        most_diverse_attendance: top_by(&regulars, limit, |a, b| a.weekdays.len().cmp(&b.weekdays.len())),
        highest_avg_order: top_by(&regulars, limit, |a, b| {
            a.avg_order_value()
                .unwrap_or(0.0)
                .total_cmp(&b.avg_order_value().unwrap_or(0.0))
        }),
        lifecycle_order: order,
        lifecycle: by_spend(&regulars, limit, order),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPerformance {
    pub weekday: Weekday,
    #[serde(flatten)]
    pub totals: Totals,
    pub shows: usize,
    pub avg_orders_per_show: Option<f64>,
    pub avg_revenue_per_show: Option<f64>,
}

/// Per-weekday averages, best orders-per-show first
pub fn day_performance(ctx: &AnalysisContext<'_>) -> Vec<DayPerformance> {
    let mut days: BTreeMap<Weekday, (Totals, BTreeSet<NaiveDate>)> = BTreeMap::new();
    for sale in ctx.rows() {
        let entry = days.entry(sale.show_weekday).or_default();
        entry.0.add(sale);
        entry.1.insert(sale.show_date);
    }

    let mut out: Vec<DayPerformance> = days
        .into_iter()
        .map(|(weekday, (totals, shows))| DayPerformance {
            weekday,
            shows: shows.len(),
            avg_orders_per_show: ratio(totals.orders as f64, shows.len() as f64),
            avg_revenue_per_show: ratio(totals.revenue, shows.len() as f64),
            totals,
        })
        .collect();
    out.sort_by(|a, b| {
        b.avg_orders_per_show
            .unwrap_or(0.0)
            .total_cmp(&a.avg_orders_per_show.unwrap_or(0.0))
            .then_with(|| a.weekday.cmp(&b.weekday))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: u32,
    pub name: String,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Totals by show month (calendar month, all years together)
pub fn seasonal(ctx: &AnalysisContext<'_>) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<u32, Totals> = BTreeMap::new();
    for sale in ctx.rows() {
        months.entry(sale.show_date.month()).or_default().add(sale);
    }
    months
        .into_iter()
        .map(|(month, totals)| MonthlyTotals {
            month,
            name: MONTH_NAMES[(month - 1) as usize].to_string(),
            totals,
        })
        .collect()
}

/// Plain-language suggestions for showrunners
pub fn recommendations(ctx: &AnalysisContext<'_>) -> Vec<String> {
    let total = Totals::of(ctx.rows());
    if total.orders == 0 {
        return Vec::new();
    }
    let orders = total.orders as f64;
    let mut out = Vec::new();

    if let Some(best) = day_performance(ctx).first() {
        out.push(format!(
            "SCHEDULING: Focus on {} shows - they average {:.1} orders per show",
            best.weekday,
            best.avg_orders_per_show.unwrap_or(0.0)
        ));
    }

    let free = ctx.rows().filter(|s| s.is_free()).count() as f64 / orders;
    if free > ATTENTION_SHARE {
        out.push(format!(
            "PRICING: {:.1}% of tickets are free - consider reducing them to boost revenue",
            free * 100.0
        ));
    } else {
        out.push(format!("PRICING: Good balance with {:.1}% free tickets", free * 100.0));
    }

    let same_day = ctx.rows().filter(|s| s.lead_days() == 0).count() as f64 / orders;
    if same_day > ATTENTION_SHARE {
        out.push(format!(
            "MARKETING: {:.1}% are same-day purchases - promote earlier for better planning",
            same_day * 100.0
        ));
    }

    if let Some(rate) = customers::compute(ctx).repeat_rate {
        out.push(format!(
            "RETENTION: {:.1}% repeat rate - implement loyalty programs to increase it",
            rate * 100.0
        ));
    }

    // States are ranked by tickets; this line is about orders
    let geo = super::geography::compute(ctx);
    if let Some(top) = geo
        .states
        .iter()
        .max_by(|a, b| a.totals.orders.cmp(&b.totals.orders).then(b.state.cmp(&a.state)))
    {
        out.push(format!(
            "GEOGRAPHIC: {:.1}% of orders come from {} - consider targeted marketing in neighbouring states",
            top.totals.orders as f64 / orders * 100.0,
            top.state
        ));
    }

    if let Some(best) = seasonal(ctx)
        .into_iter()
        .max_by(|a, b| a.totals.orders.cmp(&b.totals.orders).then(b.month.cmp(&a.month)))
    {
        out.push(format!(
            "SEASONAL: {} shows perform best - consider more shows in this month",
            best.name
        ));
    }

    out
}

/// Everything the show-level report contains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowAnalysis {
    pub filter: Option<Weekday>,
    pub individual_shows: Vec<ShowMetrics>,
    pub week_over_week: Vec<WeekdayTrend>,
    pub day_performance: Vec<DayPerformance>,
    pub seasonal: Vec<MonthlyTotals>,
    pub case_studies: CaseStudies,
    pub recommendations: Vec<String>,
}

impl ShowAnalysis {
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!("Detailed analysis saved to {}", path.display());
        Ok(())
    }
}

pub fn analyze(ctx: &AnalysisContext<'_>, min_orders: usize, limit: usize) -> ShowAnalysis {
    ShowAnalysis {
        filter: ctx.filter,
        individual_shows: show_performance(ctx),
        week_over_week: week_over_week(ctx),
        day_performance: day_performance(ctx),
        seasonal: seasonal(ctx),
        case_studies: customer_case_studies(ctx, min_orders, limit, SpendOrder::Top),
        recommendations: recommendations(ctx),
    }
}
