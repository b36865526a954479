//! Shared state behind the dashboard handlers
//!
//! The table and calendar are loaded once and never mutated, so handlers
//! borrow them without locking. Every call builds its own
//! [`AnalysisContext`] for the requested weekday.

use crate::holidays::HolidayCalendar;
use crate::metrics::shows::{self, CaseStudies, ShowMetrics, SpendOrder, WeekdayTrend};
use crate::metrics::{AnalysisContext, MetricKind, Smoothing, TrendGranularity, TrendMetric};
use crate::models::{LoadSummary, TicketTable, Weekday};
use crate::report::{self, InsightReport, SectionOutcome};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct DaysOverview {
    pub days: Vec<Weekday>,
    pub total_records: usize,
    pub skipped_rows: usize,
    pub files: Vec<LoadSummary>,
}

/// Per-request overrides for the time-trend section
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendOptions {
    /// Falls back to the service default
    pub granularity: Option<TrendGranularity>,
    pub metric: TrendMetric,
    pub smoothing: Smoothing,
}

pub struct InsightService {
    table: TicketTable,
    calendar: Arc<dyn HolidayCalendar>,
    granularity: TrendGranularity,
}

impl InsightService {
    pub fn new(table: TicketTable, calendar: Arc<dyn HolidayCalendar>) -> Self {
        Self {
            table,
            calendar,
            granularity: TrendGranularity::default(),
        }
    }

    pub fn with_granularity(mut self, granularity: TrendGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn context(&self, day: Option<Weekday>) -> AnalysisContext<'_> {
        AnalysisContext::new(&self.table, self.calendar.as_ref())
            .with_filter(day)
            .with_granularity(self.granularity)
    }

    pub fn days(&self) -> DaysOverview {
        DaysOverview {
            days: self.table.weekdays(),
            total_records: self.table.len(),
            skipped_rows: self.table.skipped_rows(),
            files: self.table.summaries().to_vec(),
        }
    }

    pub fn trend_context(&self, day: Option<Weekday>, trends: TrendOptions) -> AnalysisContext<'_> {
        self.context(day)
            .with_granularity(trends.granularity.unwrap_or(self.granularity))
            .with_trend_metric(trends.metric)
            .with_smoothing(trends.smoothing)
    }

    pub fn report(&self, day: Option<Weekday>, trends: TrendOptions) -> InsightReport {
        report::build_report(&self.trend_context(day, trends))
    }

    pub fn metric(&self, kind: MetricKind, day: Option<Weekday>, trends: TrendOptions) -> SectionOutcome {
        report::run_section(kind, &self.trend_context(day, trends))
    }

    pub fn shows(&self, day: Option<Weekday>, limit: usize) -> Vec<ShowMetrics> {
        let mut shows = shows::show_performance(&self.context(day));
        shows.truncate(limit);
        shows
    }

    pub fn week_over_week(&self, day: Option<Weekday>) -> Vec<WeekdayTrend> {
        shows::week_over_week(&self.context(day))
    }

    pub fn case_studies(
        &self,
        day: Option<Weekday>,
        min_orders: usize,
        limit: usize,
        order: SpendOrder,
    ) -> CaseStudies {
        shows::customer_case_studies(&self.context(day), min_orders, limit, order)
    }

    pub fn recommendations(&self, day: Option<Weekday>) -> Vec<String> {
        shows::recommendations(&self.context(day))
    }
}
