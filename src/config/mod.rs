//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (PROXY_PORT, KFSERVING_URL, ...)
//!     → loader.rs (read & parse)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed explicitly to the lifecycle, HTTP and backend layers
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - All fields except the port have defaults
//! - Validation separates parsing from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from, load_from_env, ConfigError};
pub use schema::BackendConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
