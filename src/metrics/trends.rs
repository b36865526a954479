//! Sales over time: period series, hour-of-day pattern, smoothing, anomaly
//! days and the order-week by show-day heatmap

use super::{mean, AnalysisContext, Totals};
use crate::error::CalculationError;
use crate::models::{TicketSale, Weekday};
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const ROLLING_WINDOW: usize = 7;
pub const EXPONENTIAL_ALPHA: f64 = 0.3;
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGranularity {
    #[default]
    Day,
    Week,
    Month,
}

impl TrendGranularity {
    /// First day of the period containing `date`
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TrendGranularity::Day => date,
            TrendGranularity::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TrendGranularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            TrendGranularity::Day => start.format("%Y-%m-%d").to_string(),
            TrendGranularity::Week => start.format("%G-W%V").to_string(),
            TrendGranularity::Month => start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for TrendGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendGranularity::Day => "day",
            TrendGranularity::Week => "week",
            TrendGranularity::Month => "month",
        })
    }
}

impl FromStr for TrendGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(TrendGranularity::Day),
            "week" | "weekly" => Ok(TrendGranularity::Week),
            "month" | "monthly" => Ok(TrendGranularity::Month),
            other => Err(format!("Unknown granularity '{}' (day, week, month)", other)),
        }
    }
}

/// Daily value that gets smoothed and checked for anomalies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    #[default]
    Orders,
    Revenue,
    Tickets,
    UniqueCustomers,
}

impl TrendMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendMetric::Orders => "orders",
            TrendMetric::Revenue => "revenue",
            TrendMetric::Tickets => "tickets",
            TrendMetric::UniqueCustomers => "unique_customers",
        }
    }

    fn value(&self, totals: &Totals, unique_customers: usize) -> f64 {
        match self {
            TrendMetric::Orders => totals.orders as f64,
            TrendMetric::Revenue => totals.revenue,
            TrendMetric::Tickets => totals.tickets as f64,
            TrendMetric::UniqueCustomers => unique_customers as f64,
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendMetric {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "orders" => Ok(TrendMetric::Orders),
            "revenue" => Ok(TrendMetric::Revenue),
            "tickets" => Ok(TrendMetric::Tickets),
            "unique_customers" | "customers" => Ok(TrendMetric::UniqueCustomers),
            other => Err(CalculationError::InvalidInput(format!(
                "Unknown trend metric '{}' (orders, revenue, tickets, unique_customers)",
                other
            ))),
        }
    }
}

/// How the daily series is smoothed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Smoothing {
    None,
    /// Centred moving average
    Rolling { window: usize },
    /// Exponentially weighted mean, bias-adjusted from the first value
    Exponential { alpha: f64 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Rolling {
            window: ROLLING_WINDOW,
        }
    }
}

impl Smoothing {
    /// Build from a method name and optional window / alpha, falling back to the defaults
    pub fn from_params(method: &str, window: Option<usize>, alpha: Option<f64>) -> Result<Self, CalculationError> {
        match method.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Smoothing::None),
            "rolling" => {
                let window = window.unwrap_or(ROLLING_WINDOW);
                if window == 0 {
                    return Err(CalculationError::InvalidInput("rolling window must be at least 1".into()));
                }
                Ok(Smoothing::Rolling { window })
            }
            "exponential" | "ewm" => {
                let alpha = alpha.unwrap_or(EXPONENTIAL_ALPHA);
                if !(alpha > 0.0 && alpha <= 1.0) {
                    return Err(CalculationError::InvalidInput(format!(
                        "alpha must be in (0, 1], got {}",
                        alpha
                    )));
                }
                Ok(Smoothing::Exponential { alpha })
            }
            other => Err(CalculationError::InvalidInput(format!(
                "Unknown smoothing '{}' (rolling, exponential, none)",
                other
            ))),
        }
    }

    pub fn apply(&self, values: &[f64]) -> Vec<Option<f64>> {
        match *self {
            Smoothing::None => values.iter().copied().map(Some).collect(),
            Smoothing::Rolling { window } => rolling_mean(values, window),
            Smoothing::Exponential { alpha } => exponential_mean(values, alpha)
                .into_iter()
                .map(Some)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub start: NaiveDate,
    #[serde(flatten)]
    pub totals: Totals,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: Totals,
    pub unique_customers: usize,
    /// The selected metric for this day
    pub value: f64,
    pub smoothed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyDay {
    pub date: NaiveDate,
    pub value: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    /// ISO week of the purchase, e.g. `2024-W03`
    pub week: String,
    /// Orders per entry of [`WeeklyHeatmap::days`]
    pub orders: Vec<usize>,
}

/// Orders by purchase week and show day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyHeatmap {
    pub days: Vec<Weekday>,
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeTrends {
    pub granularity: TrendGranularity,
    pub metric: TrendMetric,
    pub smoothing: Smoothing,
    pub series: Vec<TrendPoint>,
    /// Orders per purchase hour, 24 entries
    pub hourly_orders: Vec<usize>,
    pub peak_hour: Option<u32>,
    pub daily: Vec<DailyPoint>,
    pub anomalies: Vec<AnomalyDay>,
    pub weekly_heatmap: WeeklyHeatmap,
}

/// Centred moving average; `None` where the window runs past either end
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let half = (window / 2) as isize;
    (0..values.len())
        .map(|i| {
            let start = i as isize - half;
            let end = start + window as isize;
            if start < 0 || end > values.len() as isize {
                None
            } else {
                mean(&values[start as usize..end as usize])
            }
        })
        .collect()
}

/// Weighted mean of everything seen so far, weight `(1 - alpha)^age`
pub fn exponential_mean(values: &[f64], alpha: f64) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let (mut num, mut den) = (0.0, 0.0);
    values
        .iter()
        .map(|v| {
            num = v + decay * num;
            den = 1.0 + decay * den;
            num / den
        })
        .collect()
}

/// Population z-scores. All zero when the values have no spread.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let Some(mu) = mean(values) else {
        return Vec::new();
    };
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    let sd = variance.sqrt();
    if sd == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mu) / sd).collect()
}

#[derive(Default)]
struct Bucket<'a> {
    totals: Totals,
    customers: HashSet<&'a str>,
}

impl<'a> Bucket<'a> {
    fn add(&mut self, sale: &'a TicketSale) {
        self.totals.add(sale);
        if let Some(id) = sale.customer_id.as_deref() {
            self.customers.insert(id);
        }
    }
}

pub fn weekly_heatmap(ctx: &AnalysisContext<'_>) -> WeeklyHeatmap {
    let mut cells: BTreeMap<(i32, u32), BTreeMap<Weekday, usize>> = BTreeMap::new();
    for sale in ctx.rows() {
        let week = sale.purchased_at.date().iso_week();
        *cells
            .entry((week.year(), week.week()))
            .or_default()
            .entry(sale.show_weekday)
            .or_insert(0) += 1;
    }

    let mut days: Vec<Weekday> = cells.values().flat_map(|row| row.keys().copied()).collect();
    days.sort();
    days.dedup();

    let rows = cells
        .into_iter()
        .map(|((year, week), row)| HeatmapRow {
            week: format!("{}-W{:02}", year, week),
            orders: days.iter().map(|d| row.get(d).copied().unwrap_or(0)).collect(),
        })
        .collect();
    WeeklyHeatmap { days, rows }
}

pub fn compute(ctx: &AnalysisContext<'_>) -> TimeTrends {
    let granularity = ctx.granularity;
    let metric = ctx.trend_metric;
    let mut periods: BTreeMap<NaiveDate, Bucket<'_>> = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, Bucket<'_>> = BTreeMap::new();
    let mut hourly_orders = vec![0usize; 24];

    for sale in ctx.rows() {
        let day = sale.purchased_at.date();
        periods.entry(granularity.period_start(day)).or_default().add(sale);
        days.entry(day).or_default().add(sale);
        hourly_orders[sale.purchased_at.hour() as usize] += 1;
    }

    let series = periods
        .into_iter()
        .map(|(start, bucket)| TrendPoint {
            period: granularity.label(start),
            start,
            totals: bucket.totals,
            unique_customers: bucket.customers.len(),
        })
        .collect();

    // Earliest hour wins ties
    let peak_hour = hourly_orders
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(h, _)| h as u32);

    let values: Vec<f64> = days
        .values()
        .map(|b| metric.value(&b.totals, b.customers.len()))
        .collect();
    let smoothed = ctx.smoothing.apply(&values);
    let z = z_scores(&values);

    let mut daily = Vec::with_capacity(days.len());
    let mut anomalies = Vec::new();
    for (i, (date, bucket)) in days.into_iter().enumerate() {
        if z[i].abs() > ANOMALY_Z_THRESHOLD {
            anomalies.push(AnomalyDay {
                date,
                value: values[i],
                z_score: z[i],
            });
        }
        daily.push(DailyPoint {
            date,
            totals: bucket.totals,
            unique_customers: bucket.customers.len(),
            value: values[i],
            smoothed: smoothed[i],
        });
    }

    TimeTrends {
        granularity,
        metric,
        smoothing: ctx.smoothing,
        series,
        hourly_orders,
        peak_hour,
        daily,
        anomalies,
        weekly_heatmap: weekly_heatmap(ctx),
    }
}
