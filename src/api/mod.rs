//! Read API
//!
//! Thin axum layer over the engine's published state. No endpoint ever
//! blocks on a run: status and decisions come from the watch channel and
//! the snapshot store, and triggering returns immediately whether or not
//! a run could start.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{RunStatus, TriggerKind};
use crate::engine::{BatchEngine, DecisionSnapshot, SnapshotStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BatchEngine>,
    pub store: Arc<SnapshotStore>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    analysis_running: bool,
}

#[derive(Debug, Serialize)]
struct DecisionsResponse {
    has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(flatten)]
    snapshot: Option<DecisionSnapshot>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<RunStatus>,
    analysis_running: bool,
    server_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        analysis_running: state.engine.is_running(),
    })
}

/// Latest committed snapshot, or an explicit "no data yet" marker when no
/// run has ever completed
async fn decisions(State(state): State<AppState>) -> Json<DecisionsResponse> {
    match state.store.latest().await {
        Some(snapshot) => Json(DecisionsResponse {
            has_data: true,
            message: None,
            snapshot: Some((*snapshot).clone()),
        }),
        None => Json(DecisionsResponse {
            has_data: false,
            message: Some("no analysis has completed yet".to_string()),
            snapshot: None,
        }),
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        run: state.engine.current_status(),
        analysis_running: state.engine.is_running(),
        server_time: Utc::now(),
    })
}

/// Start a manual run. 409 when one is already in flight.
async fn trigger(
    State(state): State<AppState>,
) -> std::result::Result<(StatusCode, Json<RunStatus>), (StatusCode, Json<ErrorResponse>)> {
    match state.engine.try_trigger(TriggerKind::Manual) {
        Some(run_status) => Ok((StatusCode::ACCEPTED, Json(run_status))),
        None => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "analysis already running".to_string(),
            }),
        )),
    }
}

/// Build the router. CORS is permissive: the consumers are dashboards
/// served from other origins.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/decisions", get(decisions))
        .route("/api/status", get(status))
        .route("/api/trigger-analysis", post(trigger))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the task is dropped or the listener fails
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| EngineError::Configuration(format!("bind {bind}: {e}")))?;
    info!(addr = %bind, "read API listening");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| EngineError::Configuration(format!("serve: {e}")))?;
    Ok(())
}
