/* src/error.rs */

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fancy_log::{LogLevel, log};
use serde::Serialize;
use thiserror::Error;

/// The failures a resolution can surface to its caller.
///
/// Per-upstream failures never appear here; the fetcher absorbs them and only
/// reports total exhaustion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("all {attempted} upstream(s) failed")]
    UpstreamsExhausted { attempted: usize },
    #[error("invalid arguments for '{operation}': {reason}")]
    InvalidArguments {
        operation: &'static str,
        reason: String,
    },
    #[error("upstream path '{0}' must start with '/'")]
    InvalidPath(String),
}

impl ResolveError {
    pub(crate) fn invalid_arguments(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UpstreamsExhausted { .. } => StatusCode::BAD_GATEWAY,
            Self::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidPath(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::UpstreamsExhausted { .. } => "All upstreams failed".to_owned(),
            Self::InvalidArguments { .. } => self.to_string(),
            Self::InvalidPath(_) => {
                log(LogLevel::Error, &format!("Internal routing error: {self}"));
                "Internal server error".to_owned()
            }
        };

        (self.status(), Json(ErrorBody { detail })).into_response()
    }
}
