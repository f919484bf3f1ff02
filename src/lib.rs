//! KFServing proxy library.
//!
//! Exposes the Modzy container routes (`/`, `/status`, `/run`, `/shutdown`)
//! and forwards them to a KFServing v1 model server.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Model serving
pub mod backend;
pub mod inference;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use backend::{KfServingClient, ModelBackend};
pub use config::schema::ProxyConfig;
pub use lifecycle::{ServerInstance, ShutdownSignal};
