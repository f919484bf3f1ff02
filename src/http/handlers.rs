//! Route handlers.
//!
//! | Route | Backend call |
//! |---|---|
//! | `GET /` | none |
//! | `GET /status` | `ModelBackend::status` |
//! | `POST /run` | `ModelBackend::predict` |
//! | `POST /shutdown` | none; triggers the shutdown latch |
//!
//! Unknown paths and wrong methods get the same status body shape.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode, Uri},
    response::Response,
    Json,
};

use crate::http::response::{reply, ProxyError};
use crate::http::server::AppState;
use crate::inference::RunJob;
use crate::lifecycle::shutdown::ShutdownTrigger;

/// Liveness probe. Never contacts the backend.
pub async fn alive() -> Response {
    reply(StatusCode::OK, "alive")
}

/// Model readiness as reported by the backend.
pub async fn status(State(state): State<AppState>) -> Result<Response, ProxyError> {
    let status = state.backend.status().await?;
    if status.ready {
        Ok(reply(StatusCode::OK, "ready"))
    } else {
        Err(ProxyError::NotReady(status.name))
    }
}

/// Run an inference job against the backend.
pub async fn run(
    State(state): State<AppState>,
    payload: Result<Json<RunJob>, JsonRejection>,
) -> Result<Response, ProxyError> {
    let Json(job) = payload?;

    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        "Running inference job"
    );

    let outcome = job.execute(state.backend.as_ref()).await?;

    tracing::info!(
        inputs = outcome.inputs,
        predictions = outcome.predictions,
        results = %outcome.results_path.display(),
        "Inference job completed"
    );

    Ok(reply(StatusCode::OK, "completed"))
}

/// Request a graceful shutdown.
///
/// Always acknowledges, including repeated calls; the drain starts after
/// this response has been handed to the connection.
pub async fn shutdown(State(state): State<AppState>) -> Response {
    if !state.shutdown.trigger(ShutdownTrigger::AdminRoute) {
        tracing::debug!("Repeated shutdown request acknowledged");
    }
    reply(StatusCode::OK, "shutting down")
}

/// Fallback for paths with no route.
pub async fn not_found(uri: Uri) -> Response {
    reply(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}

/// Fallback for a known path called with the wrong method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    reply(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("{} not allowed on {}", method, uri.path()),
    )
}
