//! Server instance: owns the listening socket and the serving task.
//!
//! # State Transitions
//! ```text
//! Created ──start──▶ Serving ──signal observed──▶ ShuttingDown ──clean stop / deadline──▶ Stopped
//! ```
//!
//! `Stopped` is terminal. A stopped instance cannot be restarted; serving
//! again needs a new process.
//!
//! # Design Decisions
//! - Serving runs on its own Tokio task so the caller stays free to wait
//!   for the shutdown signal
//! - Draining uses axum's graceful shutdown: the listener is dropped first,
//!   then open connections finish their current request
//! - The drain is bounded by a caller-supplied deadline; overrunning it is
//!   reported as an error, the serving task is aborted and running handlers
//!   are cancelled

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::ListenerConfig;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::inflight::{track_in_flight, InFlightTracker};
use crate::net::listener::{self, ListenerError};

/// Deadline for in-flight requests once shutdown begins.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of a [`ServerInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Serving,
    ShuttingDown,
    Stopped,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServerState::Created => "created",
            ServerState::Serving => "serving",
            ServerState::ShuttingDown => "shutting down",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Unrecoverable server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server failed while serving: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server stopped serving without a shutdown request")]
    ServeExited,

    #[error("serving task failed: {0}")]
    ServeTask(#[from] tokio::task::JoinError),

    #[error("server failed while shutting down: {0}")]
    Shutdown(#[source] std::io::Error),

    #[error("forced shutdown after {deadline:?} with {abandoned} request(s) still in flight")]
    ShutdownTimeout { deadline: Duration, abandoned: u64 },

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ServerState,
    },
}

/// The single HTTP server of the process.
pub struct ServerInstance {
    state: ServerState,
    local_addr: Option<SocketAddr>,
    in_flight: InFlightTracker,
    drain_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl ServerInstance {
    /// Create an instance in the `Created` state. No socket is opened yet.
    pub fn new() -> Self {
        Self {
            state: ServerState::Created,
            local_addr: None,
            in_flight: InFlightTracker::new(),
            drain_tx: None,
            task: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// In-flight request accounting for this instance.
    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Bind the listener and start serving `app` on a background task.
    ///
    /// Returns the bound address. Bind failures are returned to the caller,
    /// which is expected to treat them as fatal.
    pub async fn start(
        &mut self,
        config: &ListenerConfig,
        app: Router,
    ) -> Result<SocketAddr, ServerError> {
        self.expect_state("start", &[ServerState::Created])?;

        let listener = listener::bind(config).await?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind {
                address: config.bind_address(),
                source,
            })?;

        let app = app.layer(middleware::from_fn_with_state(
            self.in_flight.clone(),
            track_in_flight,
        ));

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped sender also starts the drain.
                    let _ = drain_rx.await;
                })
                .await
        });

        self.local_addr = Some(addr);
        self.drain_tx = Some(drain_tx);
        self.task = Some(task);
        self.state = ServerState::Serving;

        tracing::info!(address = %addr, "HTTP server serving");
        Ok(addr)
    }

    /// Block until `signal` is triggered.
    ///
    /// Has no timeout. If the serving task ends on its own while waiting,
    /// that is returned as an error and the instance is `Stopped`.
    pub async fn await_shutdown(&mut self, signal: &ShutdownSignal) -> Result<(), ServerError> {
        self.expect_state("await shutdown", &[ServerState::Serving])?;
        let task = self.task.as_mut().ok_or(ServerError::InvalidState {
            operation: "await shutdown",
            state: self.state,
        })?;

        let exited = tokio::select! {
            _ = signal.wait() => None,
            joined = task => Some(joined),
        };

        match exited {
            None => {
                self.state = ServerState::ShuttingDown;
                tracing::info!("Shutdown signal observed");
                Ok(())
            }
            Some(joined) => {
                self.task = None;
                self.drain_tx = None;
                self.state = ServerState::Stopped;
                Err(match joined {
                    Ok(Ok(())) => ServerError::ServeExited,
                    Ok(Err(e)) => ServerError::Serve(e),
                    Err(e) => ServerError::ServeTask(e),
                })
            }
        }
    }

    /// Stop accepting connections and drain in-flight requests.
    ///
    /// Requests still running after `deadline` are abandoned: their handlers
    /// are dropped, the clients get a 503, and
    /// [`ServerError::ShutdownTimeout`] is returned. The listener is closed
    /// and the instance is `Stopped` whatever the outcome.
    pub async fn shutdown(&mut self, deadline: Duration) -> Result<(), ServerError> {
        self.expect_state(
            "shut down",
            &[ServerState::Serving, ServerState::ShuttingDown],
        )?;
        self.state = ServerState::ShuttingDown;

        let mut task = self.task.take().ok_or(ServerError::InvalidState {
            operation: "shut down",
            state: self.state,
        })?;

        tracing::info!(
            in_flight = self.in_flight.active_count(),
            deadline = ?deadline,
            "Shutting down server"
        );

        if let Some(drain_tx) = self.drain_tx.take() {
            let _ = drain_tx.send(());
        }

        let result = match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(ServerError::Shutdown(e)),
            Ok(Err(e)) => Err(ServerError::ServeTask(e)),
            Err(_) => {
                task.abort();
                let abandoned = self.in_flight.active_count();
                self.in_flight.abandon_all();
                tracing::warn!(abandoned, "Shutdown deadline elapsed, abandoning requests");
                Err(ServerError::ShutdownTimeout {
                    deadline,
                    abandoned,
                })
            }
        };

        self.state = ServerState::Stopped;
        if result.is_ok() {
            tracing::info!(
                served = self.in_flight.admitted_count(),
                "HTTP server stopped"
            );
        }
        result
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[ServerState],
    ) -> Result<(), ServerError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ServerError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

impl Default for ServerInstance {
    fn default() -> Self {
        Self::new()
    }
}
