//! Web layer for ChainView
//!
//! Serves the explorer page, a JSON view of the same snapshot, and static files
//! from the configured www root. Every request builds its own snapshot; only the
//! node client is shared.

use axum::{
    extract::{Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::error::ExplorerError;
use crate::explorer::{ChainSnapshot, Explorer};
use crate::render;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    explorer: Explorer,
    www_root: PathBuf,
    stats: Arc<ApiStats>,
}

impl AppState {
    pub fn new(explorer: Explorer, www_root: impl Into<PathBuf>) -> Self {
        Self {
            explorer,
            www_root: www_root.into(),
            stats: Arc::new(ApiStats::new()),
        }
    }
}

/// Request counters
#[derive(Debug)]
struct ApiStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    start_time: Instant,
}

impl ApiStats {
    fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// The chain view could not be built from the node.
    Upstream(ExplorerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ExplorerError> for ApiError {
    fn from(err: ExplorerError) -> Self {
        ApiError::Upstream(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Raw, untrusted block selection.
    pub blocknum: Option<String>,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub uptime_seconds: u64,
    pub window_size: usize,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.stats.record_request(response.status().is_success());
    response
}

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "http.request"
    );

    response
}

// ============================================================================
// Server
// ============================================================================

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/chain", get(get_chain))
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(cors);

    let serve_dir = ServeDir::new(&state.www_root);

    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), stats_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(state: AppState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %listener.local_addr()?, "web server started");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn index(State(state): State<AppState>, query: Option<Query<ViewQuery>>) -> Response {
    let blocknum = query.and_then(|Query(q)| q.blocknum);

    match state.explorer.build_chain_view(blocknum.as_deref()).await {
        Ok(snapshot) => Html(render::index_page(&snapshot)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, Html(render::error_page(&e.to_string()))).into_response(),
    }
}

async fn get_chain(
    State(state): State<AppState>,
    query: Option<Query<ViewQuery>>,
) -> Result<Json<ChainSnapshot>, ApiError> {
    let blocknum = query.and_then(|Query(q)| q.blocknum);
    let snapshot = state.explorer.build_chain_view(blocknum.as_deref()).await?;
    Ok(Json(snapshot))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "endpoint": state.explorer.source().describe(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_api_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = &state.stats;
    Json(ApiStatsResponse {
        total_requests: stats.total_requests.load(Ordering::Relaxed),
        successful_requests: stats.successful_requests.load(Ordering::Relaxed),
        failed_requests: stats.failed_requests.load(Ordering::Relaxed),
        uptime_seconds: stats.start_time.elapsed().as_secs(),
        window_size: state.explorer.window_size(),
    })
}
