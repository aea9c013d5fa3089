// src/handlers/tdms.rs
//
// TDMS views: per-date overview, per-site insight KPIs, and the visitor
// redistribution simulator.

use crate::analytics;
use crate::models::auth::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn tdms_routes() -> Router {
    Router::new()
        .route("/api/tdms/overview/:date", get(get_overview))
        .route("/api/tdms/insights/:site/:year", get(get_insights))
        .route("/api/tdms/redistribution", post(simulate_redistribution))
}

async fn get_overview(
    Path(date): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    // The date and site lists are independent lookups; fetch them together.
    let (dates, sites) = futures::join!(
        state.tdms_client.fetch_dates(),
        state.tdms_client.fetch_sites()
    );

    let dates = dates.unwrap_or_else(|e| {
        tracing::warn!("TDMS dates fetch failed: {}", e);
        Vec::new()
    });
    let sites = sites.unwrap_or_else(|e| {
        tracing::warn!("TDMS sites fetch failed: {}", e);
        Vec::new()
    });

    let vli_scores = match state.tdms_client.fetch_dashboard(&date).await {
        Ok(scores) => scores,
        Err(e) => {
            tracing::warn!("TDMS dashboard fetch failed for {}: {}", date, e);
            Vec::new()
        }
    };

    Json(serde_json::json!({
        "success": true,
        "date": date,
        "dates": dates,
        "sites": sites,
        "vli_scores": vli_scores,
    }))
}

async fn get_insights(
    Path((site, year)): Path<(String, i32)>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let monthly_data = match state.tdms_client.fetch_monthly(&site, year).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("TDMS monthly fetch failed for {}/{}: {}", site, year, e);
            Vec::new()
        }
    };

    let totals: Vec<i64> = monthly_data.iter().map(|m| m.total_visitors).collect();
    let kpis = analytics::monthly_kpis(&totals);

    Json(serde_json::json!({
        "success": true,
        "site": site,
        "year": year,
        "monthly_data": monthly_data,
        "kpis": kpis,
    }))
}

#[derive(Deserialize)]
struct RedistributionRequest {
    date: String,
    source_site: String,
    target_site: String,
    percentage: f64,
}

async fn simulate_redistribution(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RedistributionRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    if payload.source_site.is_empty() || payload.target_site.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Source and target sites are required".to_string(),
            }),
        ));
    }

    if payload.source_site == payload.target_site {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Source and target sites must differ".to_string(),
            }),
        ));
    }

    if !(0.0..=100.0).contains(&payload.percentage) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Percentage must be between 0 and 100".to_string(),
            }),
        ));
    }

    let sites = match state.tdms_client.fetch_dashboard(&payload.date).await {
        Ok(scores) => scores,
        Err(e) => {
            tracing::warn!("TDMS dashboard fetch failed for {}: {}", payload.date, e);
            Vec::new()
        }
    };

    let simulated = analytics::simulate_redistribution(
        &sites,
        &payload.source_site,
        &payload.target_site,
        payload.percentage,
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "date": payload.date,
        "source_site": payload.source_site,
        "target_site": payload.target_site,
        "percentage": payload.percentage,
        "sites": simulated,
    })))
}
