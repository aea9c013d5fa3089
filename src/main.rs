use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod assistant;
mod db;
mod forecast_client;
mod gemini_client;
mod handlers;
mod middleware;
mod models;
mod search_client;
mod tdms_client;

// Data shaping modules (from lib.rs)
mod analytics;
mod context;

use assistant::{ChatAssistant, ConversationStore};
use forecast_client::ForecastClient;
use gemini_client::GeminiClient;
use search_client::SearchClient;
use tdms_client::TdmsClient;

// AppState holds the database pool, the chat assistant and the upstream API
// clients shared by every handler.
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub conversations: ConversationStore,
    pub assistant: ChatAssistant,
    pub forecast_client: ForecastClient,
    pub tdms_client: TdmsClient,
    pub gemini_configured: bool,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize production-grade logging
    init_logging().expect("Failed to initialize logging");

    // Create the database connection pool
    let db_pool = db::create_pool()
        .await
        .expect("Failed to create database pool.");

    // Upstream services all default to the local analytics backend
    let forecast_base = std::env::var("FORECAST_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let tdms_base =
        std::env::var("TDMS_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let search_base =
        std::env::var("SEARCH_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

    let forecast_client = ForecastClient::new(forecast_base);
    let tdms_client = TdmsClient::new(tdms_base);
    let search_client = SearchClient::new(search_base);

    // Initialize Gemini client if API key is provided
    let gemini_client = match std::env::var("GEMINI_API_KEY").ok() {
        Some(api_key) if !api_key.is_empty() => {
            tracing::info!("Initializing Gemini AI client (2.5 Flash)...");
            Some(GeminiClient::new(api_key))
        }
        _ => {
            tracing::warn!(
                "GEMINI_API_KEY not found. Chat answers will fall back to a static message."
            );
            None
        }
    };
    let gemini_configured = gemini_client.is_some();

    let conversations = ConversationStore::new(db_pool.clone());
    let assistant = ChatAssistant::new(
        conversations.clone(),
        gemini_client.map(|client| Arc::new(client) as Arc<dyn assistant::GenerativeClient>),
        search_client,
        tdms_client.clone(),
        forecast_client.clone(),
    );

    // Create the shared state
    let shared_state = Arc::new(AppState {
        db_pool,
        conversations,
        assistant,
        forecast_client,
        tdms_client,
        gemini_configured,
    });

    // Build our application with all routes and shared state
    let app = Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::forecasts::forecast_routes())
        .merge(handlers::tdms::tdms_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("listening on {}", listener.local_addr().expect("local addr"));
    axum::serve(listener, app).await.expect("Server error");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Get log level from environment or default to INFO for production
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,tourview=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,tourview=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // JSON logging for production, human-readable for development
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Tourview starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );

    Ok(())
}

// API Status endpoint
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let db_status = match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let gemini_status = if state.gemini_configured { "configured" } else { "not_configured" };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "gemini_ai": gemini_status,
        },
        "features": {
            "authentication": true,
            "chat_assistant": true,
            "forecast_views": true,
            "tdms_views": true,
        },
        "endpoints": {
            "status": "/api/status",
            "auth": "/api/auth/*",
            "chat": "/api/chat/*",
            "forecasts": "/api/forecasts/*",
            "tdms": "/api/tdms/*",
        }
    }))
}
