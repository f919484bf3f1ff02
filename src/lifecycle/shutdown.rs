//! Shutdown coordination for the proxy.

use std::sync::Arc;

use tokio::sync::watch;

/// Who asked for the shutdown. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// `POST /shutdown`.
    AdminRoute,
    /// An OS signal such as SIGTERM or SIGINT.
    OsSignal(&'static str),
}

impl std::fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownTrigger::AdminRoute => write!(f, "admin route"),
            ShutdownTrigger::OsSignal(name) => write!(f, "signal {}", name),
        }
    }
}

/// One-shot shutdown latch.
///
/// The only transition is unsignaled → signaled and it happens at most once.
/// The latch remembers the transition, so a trigger that fires before anyone
/// waits is not lost. Every trigger after the first is a no-op.
///
/// Cloning is cheap; all clones share the same latch.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Create a new, unsignaled latch.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Set the latch.
    ///
    /// Returns `true` for the call that performed the transition and `false`
    /// for every later call. Never fails and never blocks.
    pub fn trigger(&self, source: ShutdownTrigger) -> bool {
        let fired = self.tx.send_if_modified(|signaled| {
            if *signaled {
                false
            } else {
                *signaled = true;
                true
            }
        });

        if fired {
            tracing::info!(source = %source, "Shutdown requested");
        } else {
            tracing::debug!(source = %source, "Shutdown already requested, ignoring trigger");
        }
        fired
    }

    /// Whether the latch has been set.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the latch is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|signaled| *signaled).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
