//! HTTP server for logmond

use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use logmon_common::Console;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Slack on top of the longest console action before the request is cut off
const TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Held for the whole of each action so actions never interleave
    pub console: Arc<Mutex<Console>>,
    pub start_time: Instant,
    /// Longer than any provisioning run, so a report is never dropped mid-run
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(console: Console) -> Self {
        let request_timeout = request_timeout(&console);
        Self::from_shared(Arc::new(Mutex::new(console)), request_timeout)
    }

    pub fn from_shared(console: Arc<Mutex<Console>>, request_timeout: Duration) -> Self {
        Self {
            console,
            start_time: Instant::now(),
            request_timeout,
        }
    }
}

/// Request timeout covering the console's slowest action
pub fn request_timeout(console: &Console) -> Duration {
    console.longest_action().saturating_add(TIMEOUT_MARGIN)
}

/// Build the router with all API routes
pub fn router(state: AppState) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::monitor_routes())
        .merge(routes::cluster_routes())
        .merge(routes::job_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gracefully");
        })
        .await?;
    Ok(())
}
