use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request failures surfaced to clients. Every variant renders as
/// `{"error": <message>}`; internals are logged server-side only.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, mistyped, or unknown fields in a request body.
    #[error("{0}")]
    Validation(String),

    /// The store was unreachable or rejected the operation.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(msg) => {
                tracing::warn!(error = %msg, "Request rejected");
                StatusCode::BAD_REQUEST
            }
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Persistence failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
