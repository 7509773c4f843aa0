//! Request-level error taxonomy.
//!
//! Every handler returns `Result<_, GatewayError>`; the `IntoResponse` impl is
//! the single place where failures become HTTP responses.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::http::response::passthrough;
use crate::upstream::{UpstreamError, UpstreamResponse};

/// Errors produced while handling a single inbound request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Body or query could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing 'group' parameter")]
    MissingGroup,

    #[error("OCM_USERNAME or OCM_PASSWORD not set")]
    CredentialsNotSet,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Not found")]
    NotFound,

    /// No response after retries (connect/reset).
    #[error("Upstream unavailable")]
    UpstreamUnavailable(#[source] UpstreamError),

    /// No response within the deadline after retries.
    #[error("Upstream timed out")]
    UpstreamTimeout(#[source] UpstreamError),

    /// The whole-request deadline passed before a response was ready.
    #[error("Request timed out")]
    DeadlineExceeded,

    /// Upstream answered with a non-success status; passed through unchanged.
    #[error("Upstream responded with status {}", .0.status)]
    UpstreamStatus(UpstreamResponse),

    #[error("Internal server error")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_)
            | GatewayError::MissingGroup
            | GatewayError::CredentialsNotSet => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) | GatewayError::DeadlineExceeded => {
                StatusCode::GATEWAY_TIMEOUT
            }
            GatewayError::UpstreamStatus(resp) => resp.status,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout { .. } => GatewayError::UpstreamTimeout(err),
            UpstreamError::Unreachable { .. } => GatewayError::UpstreamUnavailable(err),
            UpstreamError::Local(_) | UpstreamError::Client(_) => {
                GatewayError::Internal(err.to_string())
            }
        }
    }
}

impl From<BytesRejection> for GatewayError {
    /// Only an exceeded length limit is a 413; any other body failure
    /// (client abort, broken chunked encoding) is a bad request.
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge
        } else {
            GatewayError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            GatewayError::UpstreamStatus(_) => {
                tracing::info!(status = %status, "Passing through upstream error response");
            }
            GatewayError::UpstreamUnavailable(e) | GatewayError::UpstreamTimeout(e) => {
                tracing::warn!(status = %status, error = %e, "Upstream failure");
            }
            GatewayError::DeadlineExceeded => {
                tracing::warn!(status = %status, "Request deadline exceeded");
            }
            GatewayError::Internal(detail) => {
                tracing::error!(status = %status, detail = %detail, "Internal fault");
            }
            _ => {
                tracing::debug!(status = %status, error = %self, "Client error");
            }
        }

        match self {
            GatewayError::UpstreamStatus(resp) => passthrough(resp),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
