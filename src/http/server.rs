//! HTTP router setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the four proxy routes
//! - Wire up middleware (request ID, tracing, body limit, metrics)
//!
//! Binding and serving belong to the lifecycle instance; this module only
//! describes what is served.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::backend::ModelBackend;
use crate::config::schema::LimitsConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ModelBackend>,
    pub shutdown: ShutdownSignal,
}

impl AppState {
    pub fn new(backend: Arc<dyn ModelBackend>, shutdown: ShutdownSignal) -> Self {
        Self { backend, shutdown }
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState, limits: &LimitsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::alive))
        .route("/status", get(handlers::status))
        .route("/run", post(handlers::run))
        .route("/shutdown", post(handlers::shutdown))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(middleware::from_fn(record_metrics))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }),
        )
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

async fn record_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendError, BackendResult, ModelStatus, PredictRequest, PredictResponse,
    };
    use crate::http::response::StatusBody;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    struct FixedBackend {
        ready: bool,
        reachable: bool,
    }

    #[async_trait]
    impl ModelBackend for FixedBackend {
        async fn status(&self) -> BackendResult<ModelStatus> {
            if !self.reachable {
                return Err(BackendError::Unreachable("connection refused".into()));
            }
            Ok(ModelStatus {
                name: "iris".into(),
                ready: self.ready,
            })
        }

        async fn predict(&self, request: PredictRequest) -> BackendResult<PredictResponse> {
            if !self.reachable {
                return Err(BackendError::Unreachable("connection refused".into()));
            }
            Ok(PredictResponse {
                predictions: request
                    .instances
                    .iter()
                    .map(|i| json!({"input": i.name}))
                    .collect(),
            })
        }
    }

    fn router(ready: bool, reachable: bool) -> (Router, ShutdownSignal) {
        let signal = ShutdownSignal::new();
        let state = AppState::new(Arc::new(FixedBackend { ready, reachable }), signal.clone());
        (build_router(state, &LimitsConfig::default()), signal)
    }

    async fn body_of(response: Response) -> StatusBody {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
        let body = body.to_string();
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn alive_ignores_backend() {
        let (app, _) = router(false, false);
        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_of(response).await.message, "alive");
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let (app, _) = router(true, true);
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn status_reports_ready_model() {
        let (app, _) = router(true, true);
        let response = app.oneshot(get_request("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await.message, "ready");
    }

    #[tokio::test]
    async fn status_reports_unready_model() {
        let (app, _) = router(false, true);
        let response = app.oneshot(get_request("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_of(response).await;
        assert_eq!(body.status_code, 503);
        assert_eq!(body.message, "model 'iris' is not ready");
    }

    #[tokio::test]
    async fn status_maps_unreachable_backend_to_bad_gateway() {
        let (app, _) = router(true, false);
        let response = app.oneshot(get_request("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn run_rejects_malformed_body() {
        let (app, _) = router(true, true);
        let response = app
            .clone()
            .oneshot(post_json("/run", json!({"type": "file"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_of(response).await.status_code, 422);

        let request = Request::builder()
            .method("POST")
            .uri("/run")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_rejects_missing_input_directory() {
        let output = tempfile::tempdir().unwrap();
        let (app, _) = router(true, true);
        let response = app
            .oneshot(post_json(
                "/run",
                json!({"type": "file", "input": output.path().join("absent"), "output": output.path()}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_writes_results() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("sample.txt"), b"x").unwrap();

        let (app, _) = router(true, true);
        let response = app
            .oneshot(post_json(
                "/run",
                json!({"type": "file", "input": input.path(), "output": output.path()}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await.message, "completed");

        let written: serde_json::Value = serde_json::from_slice(
            &std::fs::read(output.path().join("results.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written, json!({"input": "sample.txt"}));
    }

    #[tokio::test]
    async fn shutdown_triggers_signal_and_acknowledges_repeats() {
        let (app, signal) = router(true, true);

        let first = app
            .clone()
            .oneshot(post_json("/shutdown", json!({})))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert!(signal.is_triggered());

        let second = app.oneshot(post_json("/shutdown", json!({}))).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_of(second).await.message, "shutting down");
    }

    #[tokio::test]
    async fn unknown_path_gets_status_body() {
        let (app, _) = router(true, true);
        let response = app.oneshot(get_request("/v2/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_of(response).await;
        assert_eq!(body.status_code, 404);
        assert_eq!(body.message, "no route for /v2/health");
    }

    #[tokio::test]
    async fn wrong_method_gets_status_body() {
        let (app, signal) = router(true, true);
        let response = app.oneshot(get_request("/shutdown")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_of(response).await;
        assert_eq!(body.status_code, 405);
        assert_eq!(body.message, "GET not allowed on /shutdown");
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let signal = ShutdownSignal::new();
        let state = AppState::new(
            Arc::new(FixedBackend {
                ready: true,
                reachable: true,
            }),
            signal,
        );
        let app = build_router(state, &LimitsConfig { max_body_bytes: 16 });
        let response = app
            .oneshot(post_json(
                "/run",
                json!({"type": "file", "input": "/a/long/input/path", "output": "/out"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
