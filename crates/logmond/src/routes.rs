//! API routes for logmond
//!
//! Every handler runs its console action on the blocking pool while holding
//! the console lock, so actions execute one at a time.

use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use logmon_common::{
    ClusterStatus, Console, JobStatus, MonitorRule, ProvisionReport, RegistryError, RuleView,
    VERSION,
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Errors
// ============================================================================

/// Error body returned by every route
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = if e.is_addressing() {
            StatusCode::NOT_FOUND
        } else {
            error!("Registry failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Run a console action on the blocking pool under the console lock
async fn with_console<T, F>(state: &AppState, action: F) -> Result<T, ApiError>
where
    F: FnOnce(&Console) -> T + Send + 'static,
    T: Send + 'static,
{
    let console = state.console.clone();
    tokio::task::spawn_blocking(move || {
        let guard = console
            .lock()
            .map_err(|_| ApiError::internal("console lock poisoned"))?;
        Ok(action(&guard))
    })
    .await
    .map_err(|e| ApiError::internal(format!("console task failed: {}", e)))?
}

/// Acknowledgement for registry mutations
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<MonitorRule>,
}

impl MutationResponse {
    fn ok(status: &str) -> Self {
        Self {
            status: status.to_string(),
            deleted: None,
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/v1/health", get(health_check))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Monitor Routes
// ============================================================================

pub fn monitor_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/monitors", get(list_monitors).post(add_monitor))
        .route(
            "/v1/monitors/:position",
            put(replace_monitor).delete(delete_monitor),
        )
}

async fn list_monitors(State(state): State<AppState>) -> Result<Json<Vec<RuleView>>, ApiError> {
    let views = with_console(&state, |console| console.list_rules()).await??;
    Ok(Json(views))
}

async fn add_monitor(
    State(state): State<AppState>,
    Json(rule): Json<MonitorRule>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    with_console(&state, move |console| console.add_rule(rule)).await??;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::ok("Monitor added successfully")),
    ))
}

async fn replace_monitor(
    State(state): State<AppState>,
    Path(position): Path<usize>,
    Json(rule): Json<MonitorRule>,
) -> Result<Json<MutationResponse>, ApiError> {
    with_console(&state, move |console| console.replace_rule(position, rule)).await??;
    Ok(Json(MutationResponse::ok("Monitor updated successfully")))
}

async fn delete_monitor(
    State(state): State<AppState>,
    Path(position): Path<usize>,
) -> Result<Json<MutationResponse>, ApiError> {
    let deleted = with_console(&state, move |console| console.delete_rule(position)).await??;
    Ok(Json(MutationResponse {
        status: "Monitor deleted successfully".to_string(),
        deleted: Some(deleted),
    }))
}

// ============================================================================
// Cluster Routes
// ============================================================================

pub fn cluster_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/status", get(cluster_status))
        .route("/v1/indexes/setup", post(setup_indexes))
}

async fn cluster_status(State(state): State<AppState>) -> Result<Json<ClusterStatus>, ApiError> {
    let status = with_console(&state, |console| console.cluster_status()).await?;
    Ok(Json(status))
}

async fn setup_indexes(State(state): State<AppState>) -> Result<Json<ProvisionReport>, ApiError> {
    let report = with_console(&state, |console| console.provision()).await?;
    Ok(Json(report))
}

// ============================================================================
// Job Routes
// ============================================================================

pub fn job_routes() -> Router<AppState> {
    Router::new().route("/v1/job/trigger", post(trigger_job))
}

async fn trigger_job(State(state): State<AppState>) -> Result<Json<JobStatus>, ApiError> {
    let status = with_console(&state, |console| console.trigger_job()).await?;
    Ok(Json(status))
}
