//! Comedy ticket sales insights
//!
//! Loads per-weekday ticket exports, computes sales metrics and serves them
//! to a console report, a JSON file and an HTTP dashboard.

pub mod api;
pub mod error;
pub mod holidays;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod report;

pub use error::{CalculationError, DataError};
pub use metrics::{AnalysisContext, MetricKind, MetricResult};
pub use models::{TicketSale, TicketTable, Weekday};
pub use report::{build_report, render_console, InsightReport, SectionOutcome};
