//! Health and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Service status.
    pub status: &'static str,
    /// Number of routing rules held.
    pub rules: usize,
    /// Number of apps with a gateway group.
    pub apps: usize,
    /// Number of open services.
    pub services: usize,
}

/// Health check handler.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness handler.
///
/// The router is only served after the routing mirror has loaded, so a
/// response here means decisions are being made against live rules.
pub async fn ready(State(state): State<GatewayState>) -> impl IntoResponse {
    let table = state.index.snapshot();
    let response = ReadyResponse {
        status: "ready",
        rules: table.len(),
        apps: table.group_count(),
        services: state.whitelist.snapshot().len(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
