//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into a trigger of the shared [`ShutdownSignal`]
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signals and `POST /shutdown` share one latch, so whichever comes
//!   first wins and the rest are no-ops

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{ShutdownSignal, ShutdownTrigger};

/// Spawn a task that triggers `signal` on the first SIGTERM or SIGINT.
///
/// Failure to register a handler is logged; the proxy can still be stopped
/// through `POST /shutdown`.
pub fn spawn_signal_listener(signal: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_os_signal().await {
            Ok(name) => {
                signal.trigger(ShutdownTrigger::OsSignal(name));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install OS signal handlers");
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}
