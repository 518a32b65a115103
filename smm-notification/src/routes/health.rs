use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use smm_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Health check that pings the notification store.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let store = state.notifications.store();
    let check = match store.ping().await {
        Ok(()) => HealthCheck::healthy(store.name()),
        Err(_) => HealthCheck::unhealthy(store.name(), "store unreachable"),
    };

    let response = HealthResponse::healthy(state.config.app_name.as_str(), env!("CARGO_PKG_VERSION"))
        .with_checks(vec![check]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
