//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging/metrics → Build backend + router → Start listener
//!
//! Serving (instance.rs):
//!     Created → Serving (background task) → ShuttingDown → Stopped
//!
//! Shutdown (shutdown.rs):
//!     POST /shutdown or OS signal → latch set → main task wakes
//!     → stop accepting → drain in-flight (5s deadline) → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → same latch as POST /shutdown
//! ```
//!
//! # Design Decisions
//! - The main task does nothing but wait on the latch
//! - Shutdown has a deadline: overrunning it is fatal
//! - Fatal errors share one exit path (`startup::fatal`)

pub mod instance;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use instance::{ServerError, ServerInstance, ServerState, SHUTDOWN_TIMEOUT};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use startup::{fatal, run, run_from_env, FatalError};
