//! KFServing v1 HTTP client.
//!
//! # Responsibilities
//! - Build model endpoint URLs from the configured base URL and model name
//! - Query model readiness and run predictions
//! - Map transport failures onto [`BackendError`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::types::{
    BackendError, BackendResult, ModelStatus, PredictRequest, PredictResponse,
};
use crate::backend::ModelBackend;
use crate::config::BackendConfig;
use crate::observability::metrics;

/// Client for a single model on a KFServing model server.
#[derive(Debug, Clone)]
pub struct KfServingClient {
    client: Client,
    status_url: Url,
    predict_url: Url,
    timeout_secs: u64,
}

impl KfServingClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("'{}': {}", config.base_url, e)))?;
        let status_url = model_url(&base, &config.model_name)?;
        let predict_url = model_url(&base, &format!("{}:predict", config.model_name))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        tracing::info!(
            status_url = %status_url,
            predict_url = %predict_url,
            timeout_secs = config.timeout_secs,
            "Model server client initialized"
        );

        Ok(Self {
            client,
            status_url,
            predict_url,
            timeout_secs: config.timeout_secs,
        })
    }

    /// URL queried for model readiness.
    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    /// URL used for predictions.
    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> BackendResult<T> {
        let response = response.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for KfServingClient {
    async fn status(&self) -> BackendResult<ModelStatus> {
        tracing::debug!(url = %self.status_url, "Querying model status");
        let response = self.client.get(self.status_url.clone()).send().await;
        let result = self.read_json(response).await;
        metrics::record_backend_call("status", outcome(&result));
        result
    }

    async fn predict(&self, request: PredictRequest) -> BackendResult<PredictResponse> {
        tracing::debug!(
            url = %self.predict_url,
            instances = request.instances.len(),
            "Forwarding prediction"
        );
        let response = self
            .client
            .post(self.predict_url.clone())
            .json(&request)
            .send()
            .await;
        let result = self.read_json(response).await;
        metrics::record_backend_call("predict", outcome(&result));
        result
    }
}

fn outcome<T>(result: &BackendResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(BackendError::Timeout(_)) => "timeout",
        Err(BackendError::Unreachable(_)) => "unreachable",
        Err(BackendError::Status { .. }) => "status",
        Err(BackendError::Decode(_)) => "decode",
        Err(BackendError::InvalidUrl(_)) => "invalid_url",
        Err(BackendError::Client(_)) => "client",
    }
}

/// `{base}/v1/models/{segment}`, keeping any path prefix on the base URL.
fn model_url(base: &Url, segment: &str) -> BackendResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BackendError::InvalidUrl(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(["v1", "models", segment]);
    Ok(url)
}
