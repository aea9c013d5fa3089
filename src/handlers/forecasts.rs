// src/handlers/forecasts.rs
//
// Forecast views for the dashboard. The upstream forecast API is treated as
// opaque: a failed or malformed fetch renders as an empty display set.

use crate::analytics;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

pub fn forecast_routes() -> Router {
    Router::new()
        .route("/api/forecasts/scenarios", get(get_scenarios))
        .route("/api/forecasts/daily", get(get_daily))
}

async fn get_scenarios(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let scenarios = match state.forecast_client.fetch_scenarios().await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Scenario forecast fetch failed: {}", e);
            Default::default()
        }
    };

    Json(serde_json::json!({
        "success": true,
        "baseline": scenarios.baseline,
        "optimistic": scenarios.optimistic,
        "pessimistic": scenarios.pessimistic,
    }))
}

#[derive(Deserialize)]
struct DailyQuery {
    scenario: Option<String>,
    start: Option<String>,
    days: Option<u32>,
}

async fn get_daily(
    Query(params): Query<DailyQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let scenario = params.scenario.unwrap_or_else(|| "baseline".to_string());
    let days = params.days.unwrap_or(7).clamp(1, 90);

    let forecasts = match state.forecast_client.fetch_daily().await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Daily forecast fetch failed: {}", e);
            Default::default()
        }
    };

    let series = forecasts.scenario(&scenario);
    let points: Vec<(String, f64)> = series
        .iter()
        .map(|p| (p.date.clone(), p.total_forecast))
        .collect();

    // Default to the earliest date in the series when no start is given.
    let start = params
        .start
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .or_else(|| {
            points
                .iter()
                .filter_map(|(date, _)| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
                .min()
        });

    let rows = match start {
        Some(start) => analytics::daily_window(&points, start, days),
        None => Vec::new(),
    };

    Json(serde_json::json!({
        "success": true,
        "scenario": scenario,
        "days": days,
        "rows": rows,
    }))
}
