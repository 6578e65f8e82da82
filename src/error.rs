//! Error types for the cache service
//!
//! Every non-2xx response is an [`ApiError`]: a status code plus a message
//! rendered from the catalog.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::messages::{ApiMessage, MessageService};

// == Api Error ==
/// A failed request, ready to be sent back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {}", .message.text)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: ApiMessage,
}

impl ApiError {
    /// Renders `code` with `args` and pairs it with `status`.
    pub fn render(
        messages: &dyn MessageService,
        status: StatusCode,
        code: &str,
        args: &[String],
    ) -> Self {
        Self {
            status,
            message: messages.render(code, args),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
