//! KFServing v1 wire types and backend error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the model server.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset, ...
    #[error("model server unreachable: {0}")]
    Unreachable(String),

    /// No complete response within the configured timeout.
    #[error("model server timed out after {0} seconds")]
    Timeout(u64),

    /// The model server answered with a non-success status.
    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("could not decode model server response: {0}")]
    Decode(String),

    /// The configured base URL cannot address the model endpoints.
    #[error("invalid model server URL: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be constructed.
    #[error("could not build model server client: {0}")]
    Client(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Response of `GET /v1/models/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub name: String,
    pub ready: bool,
}

/// Base64 payload in the KFServing `{"b64": ...}` convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct B64Data {
    pub b64: String,
}

/// One input instance of a predict request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInstance {
    /// Input file name.
    pub name: String,
    /// File contents.
    pub data: B64Data,
}

/// Body of `POST /v1/models/{name}:predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<InputInstance>,
}

/// Response of `POST /v1/models/{name}:predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<serde_json::Value>,
}
