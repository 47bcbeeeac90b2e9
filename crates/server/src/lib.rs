//! HTTP boundary for the shopping assistant
//!
//! Validation happens here; the core never sees oversized messages or
//! unsupported image uploads. Every failure path returns a well-formed
//! JSON shape, with timeouts and capacity errors mapped to retryable
//! statuses.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use shop_agent_core::Error as CoreError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    /// Retryable: the generation call exceeded its budget
    #[error("Request timed out. Please try again.")]
    Timeout,

    /// Retryable later: quota or rate-limit pressure
    #[error("Service temporarily unavailable. Please try again later.")]
    Capacity,

    #[error("Could not analyze the uploaded image. Please try a different photo.")]
    ImageAnalysis,

    #[error("Internal server error. Please try again.")]
    Internal(String),
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ServerError::Validation(msg),
            CoreError::GenerationTimeout(_) => ServerError::Timeout,
            CoreError::GenerationCapacity(_) => ServerError::Capacity,
            CoreError::AnalysisParse(_) => ServerError::ImageAnalysis,
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Capacity => StatusCode::TOO_MANY_REQUESTS,
            ServerError::ImageAnalysis => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Internal(ref detail) = self {
            tracing::error!(error = %detail, "Request failed");
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
