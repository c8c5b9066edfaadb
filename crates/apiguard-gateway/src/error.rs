//! API error types and responses.
//!
//! This module defines the standard error format for all API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use apiguard_auth::Access;
use apiguard_control::ControlError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The authorization engine refused the call.
    #[error("{0}")]
    Denied(Access),

    /// Invalid request headers or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The gateway is not able to serve the request.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    ///
    /// A request for a gateway group served by another instance is a
    /// routing problem, reported as `421 Misdirected Request`.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Denied(access) if access.is_topology_error() => StatusCode::MISDIRECTED_REQUEST,
            Self::Denied(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Denied(access) => access.code(),
            Self::BadRequest(_) => "bad_request",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<Access> for ApiError {
    fn from(access: Access) -> Self {
        Self::Denied(access)
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::SubscribeTimeout(_) | ControlError::Store(_) => {
                tracing::error!(error = %err, "Routing mirror unavailable");
                Self::Unavailable("routing rules not loaded".to_string())
            }
            ControlError::SnapshotDecode { .. } => {
                tracing::error!(error = %err, "Routing snapshot rejected");
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiguard_store::StoreError;
    use std::time::Duration;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::Denied(Access::ServiceNotOpen).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Denied(Access::CantAccessCurrentGatewayGroup).status_code(),
            StatusCode::MISDIRECTED_REQUEST
        );
        assert_eq!(
            ApiError::BadRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_codes() {
        assert_eq!(ApiError::Denied(Access::SignInvalid).code(), "SIGN_INVALID");
        assert_eq!(ApiError::Denied(Access::SignInvalid).to_string(), "sign invalid");
        assert_eq!(ApiError::BadRequest("test".into()).code(), "bad_request");
    }

    #[test]
    fn control_errors_map_to_unavailable() {
        let err = ApiError::from(ControlError::SubscribeTimeout(Duration::from_secs(30)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(ControlError::Store(StoreError::Connection("down".into())));
        assert_eq!(err.code(), "unavailable");
    }
}
