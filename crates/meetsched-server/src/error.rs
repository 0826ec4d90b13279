//! Server error types and their HTTP rendering.

use std::io;
use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meetsched_providers::{ErrorCode, ScheduleError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// IO error while serving.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Startup failed on configuration or provider setup.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Maps an error code to the HTTP status returned to callers.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Configuration | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::NotAuthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::AuthExchange => StatusCode::BAD_REQUEST,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::ProviderRejected | ErrorCode::InvalidResponse => StatusCode::BAD_GATEWAY,
        ErrorCode::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
        // Normally recovered inside the workflow.
        ErrorCode::Notification => StatusCode::BAD_GATEWAY,
    }
}

/// JSON error body: `{"error": "<code>", "message": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

/// An error answered to an HTTP caller.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status.
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.as_str(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        let status = status_for(err.code());
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            warn!(error = %err, "request rejected");
        }
        Self {
            status,
            code: err.code().as_str(),
            message: err.message().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
