//! HTTP dashboard for ticket sales insights
//!
//! Serves a single HTML page plus the JSON endpoints it reads from.

pub mod handlers;
pub mod service;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use service::InsightService;

pub fn create_router(service: Arc<InsightService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/days", get(handlers::get_days))
        // Report and single sections
        .route("/api/v1/report", get(handlers::get_report))
        .route("/api/v1/metrics/:kind", get(handlers::get_metric))
        // Show-level analysis
        .route("/api/v1/shows", get(handlers::get_shows))
        .route("/api/v1/week-over-week", get(handlers::get_week_over_week))
        .route("/api/v1/customers/case-studies", get(handlers::get_case_studies))
        .route("/api/v1/recommendations", get(handlers::get_recommendations))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalculationError;
    use crate::holidays::{HolidayCalendar, UsFederalHolidays};
    use crate::metrics::test_support::sale;
    use crate::models::TicketTable;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    fn table() -> TicketTable {
        // Wednesday 2024-01-10 and 2024-01-17, Friday 2024-01-12
        TicketTable::from_records(vec![
            sale("a@x.com", "2024-01-01", "2024-01-10", 2, 30.0),
            sale("b@x.com", "2024-01-09", "2024-01-10", 1, 15.0),
            sale("a@x.com", "2024-01-05", "2024-01-12", 1, 15.0),
            sale("a@x.com", "2024-01-15", "2024-01-17", 3, 45.0),
        ])
    }

    fn app_with(calendar: Arc<dyn HolidayCalendar>) -> Router {
        create_router(Arc::new(InsightService::new(table(), calendar)))
    }

    fn app() -> Router {
        app_with(Arc::new(UsFederalHolidays))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get(app(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/api/v1/report"));
    }

    #[tokio::test]
    async fn test_days() {
        let (status, json) = get(app(), "/api/v1/days").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["days"], serde_json::json!(["Wednesday", "Friday"]));
        assert_eq!(json["total_records"], 4);
    }

    #[tokio::test]
    async fn test_report_filtered_by_day() {
        let (status, json) = get(app(), "/api/v1/report?day=friday").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["filter"], "Friday");
        assert_eq!(json["overview"]["total_orders"], 1);

        let (_, all) = get(app(), "/api/v1/report?day=all").await;
        assert!(all["filter"].is_null());
        assert_eq!(all["overview"]["total_orders"], 4);
    }

    #[tokio::test]
    async fn test_invalid_day_is_bad_request() {
        let (status, json) = get(app(), "/api/v1/report?day=sunday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("sunday"));
    }

    #[tokio::test]
    async fn test_single_metric() {
        let (status, json) = get(app(), "/api/v1/metrics/repeat-customers?day=Wednesday").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["repeat_customers"], 1);

        let (status, json) = get(app(), "/api/v1/metrics/weather").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }

    struct Offline;

    impl HolidayCalendar for Offline {
        fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>, CalculationError> {
            Err(CalculationError::HolidayLookup {
                date,
                reason: "offline".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_failed_metric_is_server_error() {
        let (status, json) = get(app_with(Arc::new(Offline)), "/api/v1/metrics/holiday_impact").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("offline"));

        // the other sections of the report are unaffected
        let (status, json) = get(app_with(Arc::new(Offline)), "/api/v1/report").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["holiday_impact"]["error"].is_string());
        assert_eq!(json["geography"]["total_tickets"], 7);
    }

    #[tokio::test]
    async fn test_shows_limit() {
        let (status, json) = get(app(), "/api/v1/shows?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        let shows = json.as_array().unwrap();
        assert_eq!(shows.len(), 2);
        // most orders first
        assert_eq!(shows[0]["date"], "2024-01-10");
        assert_eq!(shows[0]["orders"], 2);
    }

    #[tokio::test]
    async fn test_week_over_week() {
        let (status, json) = get(app(), "/api/v1/week-over-week?day=Wed").await;
        assert_eq!(status, StatusCode::OK);
        let trends = json.as_array().unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0]["weekday"], "Wednesday");
        assert_eq!(trends[0]["shows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_case_studies_defaults_and_params() {
        let (status, json) = get(app(), "/api/v1/customers/case-studies").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["min_orders"], 3);
        assert_eq!(json["qualifying_customers"], 1);

        let (_, json) = get(app(), "/api/v1/customers/case-studies?min_orders=1&limit=1").await;
        assert_eq!(json["qualifying_customers"], 2);
        assert_eq!(json["highest_spenders"][0]["customer_id"], "a@x.com");
        assert_eq!(json["highest_spenders"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recommendations() {
        let (status, json) = get(app(), "/api/v1/recommendations").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["recommendations"].is_array());
        assert!(json["filter"].is_null());
    }

    #[tokio::test]
    async fn test_trend_controls() {
        let (status, json) = get(
            app(),
            "/api/v1/metrics/time_trends?metric=revenue&smoothing=exponential&alpha=1&granularity=week",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["metric"], "revenue");
        assert_eq!(json["granularity"], "week");
        assert_eq!(json["smoothing"]["method"], "exponential");
        let daily = json["daily"].as_array().unwrap();
        let values: Vec<f64> = daily.iter().map(|d| d["value"].as_f64().unwrap()).collect();
        assert_eq!(values, vec![30.0, 15.0, 15.0, 45.0]);
        assert!(daily.iter().all(|d| d["smoothed"] == d["value"]));

        // defaults: daily orders with a 7-day rolling mean
        let (_, json) = get(app(), "/api/v1/report?smoothing=&metric=").await;
        assert_eq!(json["time_trends"]["smoothing"]["method"], "rolling");
        assert_eq!(json["time_trends"]["smoothing"]["window"], 7);
        assert_eq!(json["time_trends"]["metric"], "orders");
    }

    #[tokio::test]
    async fn test_invalid_trend_controls_are_bad_requests() {
        for uri in [
            "/api/v1/report?smoothing=exponential&alpha=2",
            "/api/v1/report?smoothing=rolling&window=0",
            "/api/v1/report?smoothing=savgol",
            "/api/v1/report?metric=profit",
            "/api/v1/metrics/time_trends?granularity=hourly",
        ] {
            let (status, json) = get(app(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(json["error"].is_string(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_weekly_heatmap_in_report() {
        let (_, json) = get(app(), "/api/v1/report").await;
        let heatmap = &json["time_trends"]["weekly_heatmap"];
        assert_eq!(heatmap["days"], serde_json::json!(["Wednesday", "Friday"]));
        assert_eq!(heatmap["rows"][0]["week"], "2024-W01");
        assert_eq!(heatmap["rows"][0]["orders"], serde_json::json!([1, 1]));
        assert_eq!(heatmap["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_case_studies_lifecycle_order() {
        let uri = "/api/v1/customers/case-studies?min_orders=1&limit=1&order=bottom";
        let (status, json) = get(app(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lifecycle_order"], "bottom");
        assert_eq!(json["lifecycle"][0]["customer_id"], "b@x.com");

        let (status, _) = get(app(), "/api/v1/customers/case-studies?order=middle").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
