//! Configuration loading from the process environment.

use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Bind port. Required in practice; an absent value surfaces as a bind failure.
pub const ENV_PORT: &str = "PROXY_PORT";
/// Bind host.
pub const ENV_HOST: &str = "PROXY_HOST";
/// KFServing base URL.
pub const ENV_BACKEND_URL: &str = "KFSERVING_URL";
/// KFServing model name.
pub const ENV_MODEL_NAME: &str = "MODEL_NAME";
/// Per-call backend timeout in seconds.
pub const ENV_BACKEND_TIMEOUT: &str = "PROXY_BACKEND_TIMEOUT_SECS";
/// Inbound body size limit in bytes.
pub const ENV_MAX_BODY: &str = "PROXY_MAX_BODY_BYTES";
/// Default log filter.
pub const ENV_LOG_LEVEL: &str = "PROXY_LOG_LEVEL";
/// Log format (`pretty` or `json`).
pub const ENV_LOG_FORMAT: &str = "PROXY_LOG_FORMAT";
/// Prometheus exporter address.
pub const ENV_METRICS_ADDRESS: &str = "PROXY_METRICS_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    Parse {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary key lookup.
///
/// Unset and empty values fall back to the schema defaults.
pub fn load_from<F>(lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut config = ProxyConfig::default();

    if let Some(port) = get(ENV_PORT) {
        config.listener.port = port.trim().to_string();
    }
    if let Some(host) = get(ENV_HOST) {
        config.listener.host = host;
    }

    if let Some(url) = get(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(model) = get(ENV_MODEL_NAME) {
        config.backend.model_name = model;
    }
    if let Some(raw) = get(ENV_BACKEND_TIMEOUT) {
        config.backend.timeout_secs = parse_var(ENV_BACKEND_TIMEOUT, &raw)?;
    }

    if let Some(raw) = get(ENV_MAX_BODY) {
        config.limits.max_body_bytes = parse_var(ENV_MAX_BODY, &raw)?;
    }

    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(raw) = get(ENV_LOG_FORMAT) {
        config.observability.log_format = parse_var::<LogFormat>(ENV_LOG_FORMAT, &raw)?;
    }
    config.observability.metrics_address = get(ENV_METRICS_ADDRESS);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
