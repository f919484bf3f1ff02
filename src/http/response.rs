//! Response bodies and error mapping.
//!
//! # Design Decisions
//! - Every route answers with the same `{statusCode, status, message}` body
//! - Backend timeouts result in 504 Gateway Timeout, other backend
//!   failures in 502 Bad Gateway
//! - Request-scoped errors stop here; nothing escalates past the response

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;
use crate::inference::JobError;

/// Body of every proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub status_code: u16,
    pub status: String,
    pub message: String,
}

impl StatusBody {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.as_u16(),
            status: code.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.into(),
        }
    }
}

/// A status code plus a [`StatusBody`] carrying the same code.
pub fn reply(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(StatusBody::new(code, message))).into_response()
}

/// Errors a route handler can return.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Job(JobError),

    /// The backend answered, but the model is not serving.
    #[error("model '{0}' is not ready")]
    NotReady(String),

    /// The request body could not be extracted.
    #[error("invalid request body: {0}")]
    Payload(#[from] JsonRejection),
}

impl From<JobError> for ProxyError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Backend(e) => ProxyError::Backend(e),
            other => ProxyError::Job(other),
        }
    }
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Backend(BackendError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Backend(_) => StatusCode::BAD_GATEWAY,
            ProxyError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Payload(rejection) => rejection.status(),
            ProxyError::Job(JobError::Invalid(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::warn!(status = %code, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %code, error = %self, "Request rejected");
        }
        reply(code, self.to_string())
    }
}
