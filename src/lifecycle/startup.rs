//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the backend client in order
//! - Bind the listener and serve until shutdown is requested
//! - Funnel every unrecoverable error into [`fatal`]
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, KfServingClient};
use crate::config::{self, ConfigError, ObservabilityConfig, ProxyConfig};
use crate::http::server::{build_router, AppState};
use crate::lifecycle::instance::{ServerError, ServerInstance, SHUTDOWN_TIMEOUT};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::{logging, metrics};

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("backend client error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Process entry point: load config, serve, shut down.
///
/// Returns only after a clean shutdown; every failure ends in [`fatal`].
pub async fn run_from_env() {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            fatal(FatalError::Config(e));
        }
    };

    logging::init_logging(&config.observability);

    if let Err(e) = run(config).await {
        fatal(e);
    }
}

/// Serve `config` until the shutdown signal fires, then drain.
pub async fn run(config: ProxyConfig) -> Result<(), FatalError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        backend = %config.backend.base_url,
        model = %config.backend.model_name,
        "kfserving-proxy starting"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let signal = ShutdownSignal::new();
    spawn_signal_listener(signal.clone());

    let backend = KfServingClient::new(&config.backend)?;
    let app = build_router(AppState::new(Arc::new(backend), signal.clone()), &config.limits);

    let mut server = ServerInstance::new();
    server.start(&config.listener, app).await?;
    server.await_shutdown(&signal).await?;
    server.shutdown(SHUTDOWN_TIMEOUT).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// The single termination path for unrecoverable errors.
///
/// Logs the error and exits the process with status 1. Abandoned requests
/// and open connections die with the process.
pub fn fatal(err: impl Into<FatalError>) -> ! {
    let err = err.into();
    tracing::error!(error = %err, "Unrecoverable error, terminating");
    eprintln!("kfserving-proxy: {err}");
    std::process::exit(1)
}
