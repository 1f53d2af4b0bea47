use axum::{
    extract::State,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod classifier;
mod config;
mod encoder;
mod engine;
mod error;
mod model;
mod storage;
mod tokenizer;
mod types;
mod vocab;

use config::Config;
use engine::SentimentEngine;
use error::AppError;
use types::{PredictRequest, PredictResponse, PredictionRecord};

type AppState = Arc<SentimentEngine>;

const CHAT_PAGE: &str = include_str!("../static/chat.html");
const DASHBOARD_PAGE: &str = include_str!("../static/dashboard.html");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Loaded configuration: {:?}", config);

    // Initialize the serving engine; artifacts load lazily on first use
    let engine = SentimentEngine::new(config.clone());
    let app_state = Arc::new(engine);

    // Initialize metrics exporter
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install()
        .expect("Failed to install Prometheus exporter");

    // Build router
    let app = Router::new()
        .route("/", get(chat_page))
        .route("/dashboard", get(dashboard_page))
        .route("/predict", post(predict_handler))
        .route("/api/history", get(history_handler))
        .route("/api/predictions", get(predictions_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting sentiment engine on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

async fn predict_handler(
    State(engine): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let start = Instant::now();

    metrics::counter!("predictions_total").increment(1);

    let result = engine.predict(&request.text).await?;

    let latency = start.elapsed().as_millis() as f64;
    metrics::histogram!("prediction_duration_ms").record(latency);

    Ok(Json(result))
}

async fn history_handler(
    State(engine): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(engine.training_history().await?))
}

async fn predictions_handler(
    State(engine): State<AppState>,
) -> Result<Json<Vec<PredictionRecord>>, AppError> {
    Ok(Json(engine.recent_predictions().await?))
}

async fn health_handler() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, starting graceful shutdown");
}
