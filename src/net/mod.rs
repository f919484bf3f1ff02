//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! PROXY_PORT
//!     → listener.rs (resolve host:port, bind)
//!     → lifecycle instance (owns the socket, serves on a background task)
//!     → inflight.rs (per-request accounting while serving and draining)
//! ```
//!
//! # Design Decisions
//! - The bound socket is handed straight to the lifecycle instance; nothing
//!   else touches it
//! - In-flight accounting is per request, not per connection

pub mod inflight;
pub mod listener;

pub use inflight::{InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
