//! Lead Agent Server
//!
//! HTTP endpoints for streaming chat, lead submission and history.

pub mod http;
pub mod lifecycle;
pub mod metrics;
pub mod rate_limit;
pub mod state;

pub use http::create_router;
pub use lifecycle::{start_abandon_sweeper, sweep_abandoned};
pub use crate::metrics::{init_metrics, metrics_handler};
pub use rate_limit::{RateLimitError, RateLimiter};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<lead_agent_core::Error> for ServerError {
    fn from(err: lead_agent_core::Error) -> Self {
        use lead_agent_core::Error;
        match err {
            Error::Validation(msg) => ServerError::InvalidRequest(msg),
            Error::NotFound(msg) => ServerError::NotFound(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<RateLimitError> for ServerError {
    fn from(_: RateLimitError) -> Self {
        ServerError::RateLimit
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = match &self {
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let status = StatusCode::from(self);
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
