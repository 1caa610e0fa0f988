// Main entry point for the AquaGrade scoring service

use aquagrade::{
    catalog,
    core::types::{AnalyzeRequest, BatchRequest, BatchResponse},
    db::{history::DEFAULT_LIST_LIMIT, HistoryStore, NewHistoryRecord},
    AnalysisError, AnalysisPipeline, AnalysisResult, BatchOrchestrator, Config, Metrics,
    OnnxClassifier,
};

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    pipeline: Option<Arc<AnalysisPipeline>>,
    batch: Option<Arc<BatchOrchestrator>>,
    history: Arc<HistoryStore>,
    metrics: Metrics,
}

impl AppState {
    fn model_loaded(&self) -> bool {
        self.pipeline.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().expect("Failed to load configuration"));

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "aquagrade={},ort=off",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== AQUAGRADE SCORING SERVICE ===");

    // Open history store; a missing database file is created here
    let history = Arc::new(HistoryStore::open(config.database_path()).await?);

    // Load the classifier once; the service stays up without it and answers
    // analysis calls with model_unavailable until restarted with a model
    let (pipeline, batch) = match OnnxClassifier::load(&config).await {
        Ok(classifier) => {
            let classifier: Arc<dyn aquagrade::Classifier> = Arc::new(classifier);
            let pipeline = Arc::new(AnalysisPipeline::new(
                classifier.clone(),
                config.rng_seed(),
            ));
            let batch = Arc::new(BatchOrchestrator::new(
                classifier,
                history.clone(),
                config.rng_seed(),
            ));
            (Some(pipeline), Some(batch))
        }
        Err(e) => {
            error!("Classifier load failed, running without model: {}", e);
            (None, None)
        }
    };

    let state = AppState {
        pipeline,
        batch,
        history,
        metrics: Metrics::new(),
    };

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/batch", post(batch_analyze))
        .route("/species", get(species))
        .route("/market-data", get(market_data))
        .route("/history", get(history_list))
        .route("/metrics", get(metrics_endpoint))
        .route("/stats", get(stats_endpoint))
        .with_state(state)
        .layer(DefaultBodyLimit::max(200 * 1024 * 1024)) // base64 batches get big
        .layer(cors);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("Server starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health      - Health check");
    info!("  POST /analyze     - Analyze single fish image");
    info!("  POST /batch       - Analyze multiple fish images");
    info!("  GET  /species     - Supported species");
    info!("  GET  /market-data - Static market table");
    info!("  GET  /history     - Analysis history");
    info!("  GET  /metrics     - Prometheus metrics");
    info!("  GET  /stats       - Metrics snapshot (JSON)");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// JSON error payload with a stable machine-readable code.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn input_missing(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "input_missing",
            message: message.to_string(),
        }
    }

    fn model_unavailable() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "model_unavailable",
            message: "AI model not available".to_string(),
        }
    }

    fn store_unavailable(detail: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "store_unavailable",
            message: detail,
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        let status = match e {
            AnalysisError::InputMissing => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "modelLoaded": state.model_loaded(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Analyze a single fish image
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    state.metrics.record_request("/analyze");

    let image = req
        .image
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::input_missing("No image data provided"))?;

    let pipeline = state
        .pipeline
        .as_ref()
        .ok_or_else(ApiError::model_unavailable)?;

    let started = Instant::now();
    let result = match pipeline.analyze_data_url(&image).await {
        Ok(result) => {
            state.metrics.record_analysis(true, started.elapsed());
            result
        }
        Err(e) => {
            state.metrics.record_analysis(false, started.elapsed());
            return Err(e.into());
        }
    };

    info!(
        "Analyzed: {} ({:.1}%) grade={}",
        result.species.name, result.species.confidence, result.quality.grade
    );

    if req.debug {
        debug!("Full distribution: {:?}", result.model_info.all_probabilities);
    }

    // Persistence is best-effort: the result above is returned regardless
    if req.save_to_db {
        let filename = format!("fish_{}.jpg", Utc::now().format("%Y%m%d_%H%M%S"));
        match NewHistoryRecord::from_analysis(&result, &filename, "single") {
            Ok(record) => {
                let saved = state.history.append_best_effort(record).await;
                state.metrics.record_history_append(saved);
            }
            Err(e) => {
                error!("Could not snapshot result for history: {}", e);
                state.metrics.record_history_append(false);
            }
        }
    }

    Ok(Json(result))
}

/// Analyze multiple fish images with per-item failure isolation
async fn batch_analyze(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    state.metrics.record_request("/batch");

    if req.images.is_empty() {
        return Err(ApiError::input_missing("No images provided"));
    }

    let orchestrator = state
        .batch
        .as_ref()
        .ok_or_else(ApiError::model_unavailable)?;

    let results = orchestrator.run(&req.images, req.save_to_db).await;
    let failed = results.iter().filter(|r| !r.is_success()).count();
    state.metrics.record_batch(results.len(), failed);

    info!(
        "Batch completed: {} items, {} failed",
        results.len(),
        failed
    );

    let total_processed = results.len();
    Ok(Json(BatchResponse {
        results,
        total_processed,
    }))
}

async fn species(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.metrics.record_request("/species");
    Json(serde_json::json!({
        "species": catalog::SPECIES,
        "total": catalog::SPECIES.len(),
    }))
}

async fn market_data(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.metrics.record_request("/market-data");
    Json(serde_json::json!({
        "marketData": catalog::market_data(),
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Paginated history, newest first. Read failures surface as 500, unlike
/// append failures which never fail the originating analysis.
async fn history_list(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.metrics.record_request("/history");

    let records = state
        .history
        .list(
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            query.offset.unwrap_or(0),
        )
        .await
        .map_err(|e| {
            error!("History retrieval failed: {}", e);
            ApiError::store_unavailable(e.to_string())
        })?;

    Ok(Json(serde_json::json!({ "history": records })))
}

/// Prometheus metrics endpoint
async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// Detailed statistics endpoint (JSON)
async fn stats_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.metrics.snapshot();
    Json(serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null))
}
