//! Health check endpoints for liveness and readiness checks

use std::future::Future;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::domain::DomainError;

use super::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Static health check
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check across dependencies
///
/// The cache only backs rate limiting and idempotency, both of which fail
/// open, so a cache failure degrades readiness without failing it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let storage = check_dependency("storage", HealthStatus::Unhealthy, async {
        state.settings.get_settings().await.map(|_| ())
    })
    .await;
    let cache = check_dependency("cache", HealthStatus::Degraded, async {
        state.cache.get_raw("health:ping").await.map(|_| ())
    })
    .await;

    let overall_status = [storage.status, cache.status]
        .into_iter()
        .max_by_key(|status| match status {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
        })
        .unwrap_or(HealthStatus::Healthy);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![storage, cache]),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_dependency(
    name: &str,
    on_failure: HealthStatus,
    check: impl Future<Output = Result<(), DomainError>>,
) -> HealthCheck {
    let start = Instant::now();

    let message = match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("timed out after {:?}", PROBE_TIMEOUT)),
    };

    HealthCheck {
        name: name.to_string(),
        status: if message.is_some() {
            on_failure
        } else {
            HealthStatus::Healthy
        },
        message,
        latency_ms: start.elapsed().as_millis() as u64,
    }
}
