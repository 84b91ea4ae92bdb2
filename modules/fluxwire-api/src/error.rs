use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use fluxwire_rag::AnswerError;
use fluxwire_store::StoreError;

/// API-edge error mapping: validation problems surface with detail as 4xx;
/// everything internal becomes a generic 500.
pub enum ApiError {
    Validation(String),
    NotFound(&'static str),
    Conflict(String),
    Busy(&'static str),
    Internal,
}

impl ApiError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!(error = %err, "{context}");
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Conflict(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Busy(message) => (StatusCode::CONFLICT, message.to_string()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "detail": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("resource"),
            other => ApiError::internal("store error", other),
        }
    }
}

impl From<AnswerError> for ApiError {
    fn from(err: AnswerError) -> Self {
        // Timeouts and provider failures are user-visible only as a generic
        // failure; details go to the log.
        ApiError::internal("answer generation failed", err)
    }
}
