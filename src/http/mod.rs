//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! connection (served by the lifecycle instance)
//!     → request.rs (assign/propagate request ID)
//!     → server.rs (router, tracing, body limit, metrics)
//!     → handlers.rs (alive / status / run / shutdown)
//!     → backend (status, predict)
//!     → response.rs (status body, error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ProxyError, StatusBody};
pub use server::{build_router, AppState};
