//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Query handlers take the current snapshot once and run against it; a
//! concurrent reload never changes the graph a request is reading.

use super::{
    AppState,
    types::{HealthResponse, QueryRequest, QueryResponse, ReloadResponse, StatusResponse},
};
use crate::cli::load_graph;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use medgraph_core::{GraphDocument, GraphMetrics, MedGraphError, execute};

/// Map a core error to an HTTP status.
fn status_for(error: &MedGraphError) -> StatusCode {
    match error {
        MedGraphError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        MedGraphError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        MedGraphError::Source(_) | MedGraphError::Serialization(_) | MedGraphError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get snapshot status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let graph = state.snapshot.load();

    let response = StatusResponse {
        revision: state.snapshot.revision(),
        source: state.source.as_ref().map(|p| p.display().to_string()),
        metrics: GraphMetrics::from_graph(&graph),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// QUERY HANDLER
// =============================================================================

/// Execute a query.
pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    let query = match request.to_query(&state.paths) {
        Ok(q) => q,
        Err(e) => {
            return (
                status_for(&e),
                Json(QueryResponse::error(format!("Query failed: {}", e))),
            );
        }
    };

    let graph = state.snapshot.load();
    let result = tokio::task::spawn_blocking(move || execute(&graph, &query)).await;

    match result {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(QueryResponse::from_outcome(outcome))),
        Ok(Err(e)) => (
            status_for(&e),
            Json(QueryResponse::error(format!("Query failed: {}", e))),
        ),
        Err(e) => {
            tracing::error!("Query task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QueryResponse::error("Query task failed")),
            )
        }
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the current snapshot as a graph document.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let graph = state.snapshot.load();
    (StatusCode::OK, Json(GraphDocument::from_graph(&graph)))
}

// =============================================================================
// RELOAD HANDLER
// =============================================================================

/// Rebuild the graph from the entity source and publish it.
///
/// Readers keep serving the previous snapshot until the new one is
/// published; a failed rebuild leaves it in place.
pub async fn reload_handler(State(state): State<AppState>) -> impl IntoResponse {
    let Some(source) = state.source.clone() else {
        return (
            StatusCode::CONFLICT,
            Json(ReloadResponse::error("No entity source configured")),
        );
    };

    let _guard = state.reload_lock.lock().await;

    let built = tokio::task::spawn_blocking(move || load_graph(Some(source.as_path()))).await;
    match built {
        Ok(Ok((graph, report))) => {
            let (nodes, edges) = (graph.node_count(), graph.edge_count());
            let revision = state.snapshot.publish(graph);
            (
                StatusCode::OK,
                Json(ReloadResponse::success(
                    revision,
                    nodes,
                    edges,
                    report.skipped(),
                )),
            )
        }
        Ok(Err(e)) => {
            tracing::warn!("Reload failed, keeping revision {}: {}", state.snapshot.revision(), e);
            (
                status_for(&e),
                Json(ReloadResponse::error(format!("Reload failed: {}", e))),
            )
        }
        Err(e) => {
            tracing::error!("Reload task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReloadResponse::error("Reload task failed")),
            )
        }
    }
}
