//! Health check handlers and response types.

use crate::constants::HEALTH_CHECK_TIMEOUT_SECS;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(TIMEOUT, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub media_store: String,
    pub job_queue: String,
    pub live_workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_jobs: Option<u64>,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - stores reachable and at least one worker running.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let media_store = run_check(state.media_store.ping(), "not_ready").await;
    let job_queue = run_check(state.job_queue.ping(), "not_ready").await;
    let live_workers = state.job_queue.live_workers();

    let ready = media_store == "healthy" && job_queue == "healthy" && live_workers > 0;
    if !ready {
        tracing::warn!(
            media_store = %media_store,
            job_queue = %job_queue,
            live_workers = live_workers,
            "Readiness check failed"
        );
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "media_store": media_store,
            "job_queue": job_queue,
            "live_workers": live_workers,
        })),
    )
}

/// Full health check: store connectivity, queue connectivity and depth, worker count.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = HealthCheckResponse {
        status: "healthy".to_string(),
        media_store: run_check(state.media_store.ping(), "unhealthy").await,
        job_queue: run_check(state.job_queue.ping(), "unhealthy").await,
        live_workers: state.job_queue.live_workers(),
        outstanding_jobs: None,
    };

    if response.job_queue == "healthy" {
        response.outstanding_jobs = tokio::time::timeout(TIMEOUT, state.job_queue.outstanding())
            .await
            .ok()
            .and_then(Result::ok);
    }

    let overall_healthy = response.media_store == "healthy"
        && response.job_queue == "healthy"
        && response.live_workers > 0;
    if !overall_healthy {
        response.status = "unhealthy".to_string();
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
