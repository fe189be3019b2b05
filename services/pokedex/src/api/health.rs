//! Health check endpoints.
//!
//! These endpoints are used by load balancers and orchestration systems
//! to determine if the service is healthy and ready to receive traffic.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status: "ok" or "degraded".
    pub status: String,

    /// Service name.
    pub service: String,

    /// Service version.
    pub version: String,

    /// Current timestamp (ISO 8601).
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentHealth>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentHealth {
    /// Creature store status.
    pub store: ComponentStatus,
}

/// Individual component status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ComponentStatus {
    /// Status: "ok" or "unavailable".
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Create health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

fn response(status: &str, components: Option<ComponentHealth>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: "pokedex".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        components,
    }
}

/// Basic health check - is the service running?
///
/// Does not check dependencies.
async fn healthz() -> impl IntoResponse {
    Json(response("ok", None))
}

/// Readiness check - can the store be reached?
///
/// Returns 503 if the store is unavailable. The store error is only logged.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let store_result = state.store().health_check().await;
    if let Err(e) = &store_result {
        tracing::warn!(error = %e, "Store health check failed");
    }
    let store_ok = store_result.is_ok();

    let components = ComponentHealth {
        store: ComponentStatus {
            status: if store_ok { "ok" } else { "unavailable" }.to_string(),
            message: (!store_ok).then(|| "store unreachable".to_string()),
        },
    };

    if store_ok {
        (StatusCode::OK, Json(response("ok", Some(components))))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(response("degraded", Some(components))),
        )
    }
}

/// Liveness check - is the service alive?
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}
