//! HTTP-facing error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::types::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The supplied shared secret did not match.
    #[error("Invalid Secret")]
    AuthorizationFailure,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::AuthorizationFailure => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(%status, error = %self, "Request rejected");
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
