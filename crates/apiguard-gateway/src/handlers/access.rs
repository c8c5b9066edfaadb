//! Authorization check endpoint.
//!
//! The gateway pipeline calls this for every inbound request before
//! forwarding it; a 200 response means the call may proceed.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Json;
use serde::Serialize;

use apiguard_auth::{Access, Decision};
use apiguard_core::ApiConfig;

use crate::error::ApiError;
use crate::request::access_request;
use crate::state::GatewayState;

/// A successful authorization.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// Always `YES`.
    pub access: Access,
    /// The rule that matched, absent for privileged pass-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ApiConfig>,
}

/// Decide whether the calling app may invoke `service` at `path`.
///
/// ```text
/// GET /proxy/orders/orders/1
/// fizz-appid: partnerX
/// fizz-ts: 1000
/// fizz-sign: cfae7376...
///
/// Response: 200 OK
/// { "access": "YES", "rule": { "id": 1, ... } }
///
/// Response: 403 Forbidden
/// { "error": { "code": "SIGN_INVALID", "message": "sign invalid" } }
/// ```
///
/// # Errors
///
/// Returns `ApiError::Denied` with the refusal, or `ApiError::BadRequest` if
/// the app header is missing.
pub async fn check(
    State(state): State<GatewayState>,
    Path((service, path)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(StatusCode, Json<AccessResponse>), ApiError> {
    decide(&state, &service, &path, &method, &headers, peer).await
}

/// Decide a call to the root path `/` of `service`.
///
/// Handles `/proxy/:service` and `/proxy/:service/`, which the wildcard
/// route does not match.
///
/// # Errors
///
/// Same as [`check`].
pub async fn check_root(
    State(state): State<GatewayState>,
    Path(service): Path<String>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(StatusCode, Json<AccessResponse>), ApiError> {
    decide(&state, &service, "/", &method, &headers, peer).await
}

async fn decide(
    state: &GatewayState,
    service: &str,
    path: &str,
    method: &Method,
    headers: &HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<(StatusCode, Json<AccessResponse>), ApiError> {
    let request = access_request(
        &state.config,
        headers,
        method,
        service,
        path,
        peer.map(|ConnectInfo(addr)| addr),
    )?;

    match state.engine.can_access(&request).await {
        Decision::Api(ac) => Ok((
            StatusCode::OK,
            Json(AccessResponse {
                access: Access::Yes,
                rule: Some(ApiConfig::clone(&ac)),
            }),
        )),
        Decision::Access(Access::Yes) => Ok((
            StatusCode::OK,
            Json(AccessResponse {
                access: Access::Yes,
                rule: None,
            }),
        )),
        Decision::Access(refusal) => Err(ApiError::Denied(refusal)),
    }
}
