//! Metric calculators
//!
//! Every calculator reads rows through [`AnalysisContext::rows`], so the
//! weekday filter is applied the same way everywhere. Empty input gives
//! empty or zero results; rates with a zero denominator are `None`.

pub mod customers;
pub mod geography;
pub mod holiday_impact;
pub mod overview;
pub mod payments;
pub mod shows;
pub mod timing;
pub mod trends;

use crate::error::CalculationError;
use crate::holidays::HolidayCalendar;
use crate::models::{TicketSale, TicketTable, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use trends::{Smoothing, TrendGranularity, TrendMetric};

/// Everything a calculator needs for one analysis run or one dashboard request
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub table: &'a TicketTable,
    pub filter: Option<Weekday>,
    pub calendar: &'a dyn HolidayCalendar,
    pub granularity: TrendGranularity,
    pub trend_metric: TrendMetric,
    pub smoothing: Smoothing,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(table: &'a TicketTable, calendar: &'a dyn HolidayCalendar) -> Self {
        Self {
            table,
            filter: None,
            calendar,
            granularity: TrendGranularity::default(),
            trend_metric: TrendMetric::default(),
            smoothing: Smoothing::default(),
        }
    }

    pub fn with_filter(mut self, filter: Option<Weekday>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_granularity(mut self, granularity: TrendGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_trend_metric(mut self, metric: TrendMetric) -> Self {
        self.trend_metric = metric;
        self
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a TicketSale> + 'a {
        self.table.rows(self.filter)
    }

    pub fn filter_label(&self) -> &'static str {
        self.filter.map_or("All days", |d| d.as_str())
    }
}

/// Running totals shared by every grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub orders: usize,
    pub tickets: u64,
    pub revenue: f64,
}

impl Totals {
    pub fn add(&mut self, sale: &TicketSale) {
        self.orders += 1;
        self.tickets += u64::from(sale.ticket_quantity);
        self.revenue += sale.price;
    }

    pub fn of<'s>(sales: impl IntoIterator<Item = &'s TicketSale>) -> Self {
        let mut totals = Self::default();
        for sale in sales {
            totals.add(sale);
        }
        totals
    }
}

/// `num / den`, or `None` when `den` is zero
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    (den != 0.0).then(|| num / den)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    ratio(values.iter().sum(), values.len() as f64)
}

/// Insight categories, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Overview,
    TimeTrends,
    PurchaseTiming,
    RepeatCustomers,
    Geography,
    HolidayImpact,
    PaymentPatterns,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Overview,
        MetricKind::TimeTrends,
        MetricKind::PurchaseTiming,
        MetricKind::RepeatCustomers,
        MetricKind::Geography,
        MetricKind::HolidayImpact,
        MetricKind::PaymentPatterns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Overview => "overview",
            MetricKind::TimeTrends => "time_trends",
            MetricKind::PurchaseTiming => "purchase_timing",
            MetricKind::RepeatCustomers => "repeat_customers",
            MetricKind::Geography => "geography",
            MetricKind::HolidayImpact => "holiday_impact",
            MetricKind::PaymentPatterns => "payment_patterns",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Overview => "OVERVIEW",
            MetricKind::TimeTrends => "SALES OVER TIME",
            MetricKind::PurchaseTiming => "PURCHASE TIMING",
            MetricKind::RepeatCustomers => "CUSTOMER INSIGHTS",
            MetricKind::Geography => "GEOGRAPHY",
            MetricKind::HolidayImpact => "HOLIDAY IMPACT",
            MetricKind::PaymentPatterns => "PAYMENTS & TICKET QUANTITIES",
        }
    }

    /// Run this category's calculator
    pub fn compute(&self, ctx: &AnalysisContext<'_>) -> Result<MetricResult, CalculationError> {
        Ok(match self {
            MetricKind::Overview => MetricResult::Overview(overview::compute(ctx)),
            MetricKind::TimeTrends => MetricResult::TimeTrends(trends::compute(ctx)),
            MetricKind::PurchaseTiming => MetricResult::PurchaseTiming(timing::compute(ctx)),
            MetricKind::RepeatCustomers => MetricResult::RepeatCustomers(customers::compute(ctx)),
            MetricKind::Geography => MetricResult::Geography(geography::compute(ctx)),
            MetricKind::HolidayImpact => MetricResult::HolidayImpact(holiday_impact::compute(ctx)?),
            MetricKind::PaymentPatterns => MetricResult::PaymentPatterns(payments::compute(ctx)),
        })
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim().to_ascii_lowercase().replace('-', "_"))
            .ok_or_else(|| format!("Unknown metric '{}'", s))
    }
}

/// One calculator's output, tagged by category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricResult {
    Overview(overview::Overview),
    TimeTrends(trends::TimeTrends),
    PurchaseTiming(timing::PurchaseTiming),
    RepeatCustomers(customers::RepeatCustomers),
    Geography(geography::Geography),
    HolidayImpact(holiday_impact::HolidayImpact),
    PaymentPatterns(payments::PaymentPatterns),
}

impl MetricResult {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricResult::Overview(_) => MetricKind::Overview,
            MetricResult::TimeTrends(_) => MetricKind::TimeTrends,
            MetricResult::PurchaseTiming(_) => MetricKind::PurchaseTiming,
            MetricResult::RepeatCustomers(_) => MetricKind::RepeatCustomers,
            MetricResult::Geography(_) => MetricKind::Geography,
            MetricResult::HolidayImpact(_) => MetricKind::HolidayImpact,
            MetricResult::PaymentPatterns(_) => MetricKind::PaymentPatterns,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Location, TicketSale, Weekday};
    use chrono::NaiveDate;

    /// Sale with sensible defaults; dates are `YYYY-MM-DD`, purchase at 19:00
    pub fn sale(customer: &str, purchased: &str, show: &str, qty: u32, price: f64) -> TicketSale {
        let show_date = NaiveDate::parse_from_str(show, "%Y-%m-%d").unwrap();
        let purchased_at = NaiveDate::parse_from_str(purchased, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap();
        TicketSale {
            order_id: None,
            purchased_at,
            show_date,
            show_weekday: Weekday::of(show_date).expect("test show dates are Mon..Sat"),
            event_name: Some("Comedy Night".into()),
            customer_id: (!customer.is_empty()).then(|| customer.to_string()),
            location: Location::new("Washington", "DC"),
            payment_method: "Card".into(),
            ticket_quantity: qty,
            price,
        }
    }

    pub fn at(mut s: TicketSale, city: &str, state: &str) -> TicketSale {
        s.location = Location::new(city, state);
        s
    }

    pub fn paid_with(mut s: TicketSale, method: &str) -> TicketSale {
        s.payment_method = method.into();
        s
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sale;
    use super::*;
    use crate::holidays::UsFederalHolidays;

    #[test]
    fn test_ratio_guards_zero() {
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(1.0, 4.0), Some(0.25));
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_metric_kind_parsing() {
        assert_eq!("purchase-timing".parse::<MetricKind>(), Ok(MetricKind::PurchaseTiming));
        assert_eq!("Geography".parse::<MetricKind>(), Ok(MetricKind::Geography));
        assert!("weather".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_filter_applies_to_every_calculator() {
        // Wednesday 2024-01-10, Friday 2024-01-12
        let table = TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-01", "2024-01-10", 2, 20.0),
            sale("b@x.com", "2024-01-02", "2024-01-12", 3, 45.0),
            sale("a@x.com", "2024-01-03", "2024-01-12", 1, 15.0),
        ]);
        let cal = UsFederalHolidays;
        let ctx = AnalysisContext::new(&table, &cal).with_filter(Some(Weekday::Friday));

        assert!(ctx.rows().all(|r| r.show_weekday == Weekday::Friday));
        let overview = overview::compute(&ctx);
        assert_eq!(overview.total_orders, 2);
        assert_eq!(overview.total_tickets, 4);
        let geo = geography::compute(&ctx);
        assert_eq!(geo.locations.iter().map(|l| l.totals.tickets).sum::<u64>(), 4);
        let customers = customers::compute(&ctx);
        // a@x.com only has one Friday show
        assert_eq!(customers.repeat_customers, 0);
    }

    #[test]
    fn test_every_calculator_handles_empty_table() {
        let table = TicketTable::default();
        let cal = UsFederalHolidays;
        let ctx = AnalysisContext::new(&table, &cal);
        for kind in MetricKind::ALL {
            let result = kind.compute(&ctx).expect("empty input is not an error");
            assert_eq!(result.kind(), kind);
        }
        assert_eq!(customers::compute(&ctx).repeat_rate, None);
        assert_eq!(overview::compute(&ctx).avg_order_value, None);
    }
}
