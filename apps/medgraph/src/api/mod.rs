//! # MedGraph HTTP API Module
//!
//! This module implements the HTTP query service using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Snapshot revision and graph metrics
//! - `POST /query` - Execute a query against the current snapshot
//! - `GET /export` - Export the current snapshot as a graph document
//! - `POST /reload` - Rebuild from the entity source and publish
//!
//! ## Configuration
//!
//! - `MEDGRAPH_CORS_ORIGINS` (or `[server] cors_origins`): Comma-separated
//!   list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `medgraph::api::*`)
pub use handlers::{
    export_handler, health_handler, query_handler, reload_handler, status_handler,
};
pub use types::{HealthResponse, QueryRequest, QueryResponse, ReloadResponse, StatusResponse};

use crate::config::{AppConfig, PathsConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use medgraph_core::{Graph, MedGraphError, SnapshotCell};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the published snapshot plus what is needed to
/// rebuild it.
#[derive(Clone)]
pub struct AppState {
    /// The current graph snapshot.
    pub snapshot: Arc<SnapshotCell>,
    /// Catalog the graph is rebuilt from on reload.
    pub source: Option<PathBuf>,
    /// Default path search bounds.
    pub paths: PathsConfig,
    /// Serializes rebuilds; readers never take it.
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Create new app state around an initial graph.
    #[must_use]
    pub fn new(graph: Graph, source: Option<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            snapshot: Arc::new(SnapshotCell::new(graph)),
            source,
            paths,
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// App state with default path bounds and no source.
    #[must_use]
    pub fn with_graph(graph: Graph) -> Self {
        Self::new(graph, None, PathsConfig::default())
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from the configured origin list.
///
/// - `"*"`: allows all origins
/// - `None`: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with localhost-only CORS.
pub fn create_router(state: AppState) -> Router {
    create_router_with_cors(state, None)
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
pub fn create_router_with_cors(state: AppState, cors_origins: Option<&str>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/query", post(handlers::query_handler))
        .route("/export", get(handlers::export_handler))
        .route("/reload", post(handlers::reload_handler))
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(config: &AppConfig, graph: Graph) -> Result<(), MedGraphError> {
    let state = AppState::new(graph, config.source.clone(), config.paths);
    let router = create_router_with_cors(state, config.server.cors_origins.as_deref());
    let addr = config.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MedGraphError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("MedGraph HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MedGraphError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
