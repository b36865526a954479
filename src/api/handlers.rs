//! REST handlers for the insights dashboard

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::{DaysOverview, InsightService, TrendOptions};
use crate::error::CalculationError;
use crate::metrics::shows::{CaseStudies, ShowMetrics, SpendOrder, WeekdayTrend};
use crate::metrics::{MetricKind, MetricResult, Smoothing, TrendGranularity, TrendMetric};
use crate::models::Weekday;
use crate::report::{InsightReport, SectionOutcome};

pub const DEFAULT_SHOW_LIMIT: usize = 20;
pub const DEFAULT_MIN_ORDERS: usize = 3;
pub const DEFAULT_CASE_LIMIT: usize = 5;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub filter: Option<Weekday>,
    pub recommendations: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize)]
pub struct DayQuery {
    pub day: Option<String>,
}

/// Day filter plus the time-trend controls
#[derive(Deserialize)]
pub struct ReportQuery {
    pub day: Option<String>,
    pub granularity: Option<String>,
    pub metric: Option<String>,
    pub smoothing: Option<String>,
    pub window: Option<usize>,
    pub alpha: Option<f64>,
}

#[derive(Deserialize)]
pub struct ShowsQuery {
    pub day: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct CaseStudiesQuery {
    pub day: Option<String>,
    pub min_orders: Option<usize>,
    pub limit: Option<usize>,
    /// `top` or `bottom` spenders in the lifecycle view
    pub order: Option<String>,
}

/// Missing, empty or `all` means no filter
fn parse_day(day: Option<&str>) -> Result<Option<Weekday>, ApiError> {
    match day.map(str::trim) {
        None | Some("") => Ok(None),
        Some(d) if d.eq_ignore_ascii_case("all") => Ok(None),
        Some(d) => d
            .parse()
            .map(Some)
            .map_err(|e: crate::models::ParseWeekdayError| api_error(StatusCode::BAD_REQUEST, e.to_string())),
    }
}

fn bad_request(e: CalculationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string())
}

/// Blank query values count as missing
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn trend_options(params: &ReportQuery) -> Result<TrendOptions, ApiError> {
    let granularity = given(&params.granularity)
        .map(str::parse::<TrendGranularity>)
        .transpose()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let metric = given(&params.metric)
        .map(str::parse::<TrendMetric>)
        .transpose()
        .map_err(bad_request)?
        .unwrap_or_default();
    let method = given(&params.smoothing).unwrap_or("rolling");
    let smoothing = Smoothing::from_params(method, params.window, params.alpha).map_err(bad_request)?;
    Ok(TrendOptions {
        granularity,
        metric,
        smoothing,
    })
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<InsightService>;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/days
pub async fn get_days(State(service): State<AppState>) -> Json<DaysOverview> {
    Json(service.days())
}

/// GET /api/v1/report?day=&granularity=&metric=&smoothing=&window=&alpha=
pub async fn get_report(
    State(service): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<InsightReport>, ApiError> {
    let day = parse_day(params.day.as_deref())?;
    let trends = trend_options(&params)?;
    Ok(Json(service.report(day, trends)))
}

/// GET /api/v1/metrics/:kind?day= (plus the report's trend parameters)
pub async fn get_metric(
    State(service): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<MetricResult>, ApiError> {
    let kind: MetricKind = kind
        .parse()
        .map_err(|e: String| api_error(StatusCode::NOT_FOUND, e))?;
    let day = parse_day(params.day.as_deref())?;
    let trends = trend_options(&params)?;
    match service.metric(kind, day, trends) {
        SectionOutcome::Ok(result) => Ok(Json(result)),
        SectionOutcome::Failed { error } => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, error)),
    }
}

/// GET /api/v1/shows?day=&limit=
pub async fn get_shows(
    State(service): State<AppState>,
    Query(params): Query<ShowsQuery>,
) -> Result<Json<Vec<ShowMetrics>>, ApiError> {
    let day = parse_day(params.day.as_deref())?;
    let limit = params.limit.unwrap_or(DEFAULT_SHOW_LIMIT);
    Ok(Json(service.shows(day, limit)))
}

/// GET /api/v1/week-over-week?day=
pub async fn get_week_over_week(
    State(service): State<AppState>,
    Query(params): Query<DayQuery>,
) -> Result<Json<Vec<WeekdayTrend>>, ApiError> {
    let day = parse_day(params.day.as_deref())?;
    Ok(Json(service.week_over_week(day)))
}

/// GET /api/v1/customers/case-studies?min_orders=&limit=&order=&day=
pub async fn get_case_studies(
    State(service): State<AppState>,
    Query(params): Query<CaseStudiesQuery>,
) -> Result<Json<CaseStudies>, ApiError> {
    let day = parse_day(params.day.as_deref())?;
    let min_orders = params.min_orders.unwrap_or(DEFAULT_MIN_ORDERS);
    let limit = params.limit.unwrap_or(DEFAULT_CASE_LIMIT);
    let order = given(&params.order)
        .map(str::parse::<SpendOrder>)
        .transpose()
        .map_err(bad_request)?
        .unwrap_or_default();
    Ok(Json(service.case_studies(day, min_orders, limit, order)))
}

/// GET /api/v1/recommendations?day=
pub async fn get_recommendations(
    State(service): State<AppState>,
    Query(params): Query<DayQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let day = parse_day(params.day.as_deref())?;
    Ok(Json(RecommendationsResponse {
        filter: day,
        recommendations: service.recommendations(day),
    }))
}
