//! Model-serving backend subsystem.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → ModelBackend (status / predict contract)
//!     → client.rs (KFServing v1 over HTTP)
//!     → model server
//! ```
//!
//! # Design Decisions
//! - Handlers depend on the [`ModelBackend`] trait only, so tests can swap
//!   in an in-process backend
//! - One request per call; no retries, no pooling across models
//! - Every failure is a [`BackendError`] value, never a panic

pub mod client;
pub mod types;

use async_trait::async_trait;

pub use client::KfServingClient;
pub use types::{
    B64Data, BackendError, BackendResult, InputInstance, ModelStatus, PredictRequest,
    PredictResponse,
};

/// Request/response contract of the model-serving backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Readiness of the served model.
    async fn status(&self) -> BackendResult<ModelStatus>;

    /// Run a prediction.
    async fn predict(&self, request: PredictRequest) -> BackendResult<PredictResponse>;
}
