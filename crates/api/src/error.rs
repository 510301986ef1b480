use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use passage_core::error::CoreError;
use serde::Serialize;
use utoipa::ToSchema;

/// Body shared by every authentication failure so callers cannot tell a
/// wrong token from an expired or revoked one.
const AUTH_FAILURE_MESSAGE: &str = "Invalid or expired credentials";

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message.
    #[schema(example = "Invalid or expired credentials")]
    pub error: String,
    /// Stable machine-readable code.
    #[schema(example = "UNAUTHORIZED")]
    pub code: &'static str,
}

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `passage_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) if core.is_auth_failure() => {
                tracing::warn!(error = %core, "Authentication failed");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    AUTH_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::Core(CoreError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::Core(core) => {
                tracing::error!(error = %core, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}
