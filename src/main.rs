//! KFServing proxy.
//!
//! Bridges the Modzy container contract to a KFServing v1 model server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                kfserving-proxy               │
//!   GET  /           │  ┌──────────┐   ┌──────────┐                 │
//!   GET  /status  ───┼─▶│ listener │──▶│  router  │──┬─▶ alive      │
//!   POST /run        │  │ (serving │   │ request  │  ├─▶ status ────┼──▶ GET  /v1/models/{m}
//!   POST /shutdown   │  │   task)  │   │ id/trace │  ├─▶ run ───────┼──▶ POST /v1/models/{m}:predict
//!                    │  └──────────┘   └──────────┘  └─▶ shutdown   │
//!                    │        ▲                            │         │
//!                    │        │ drain (5s)                 ▼         │
//!                    │  ┌─────┴──────┐   wait    ┌──────────────┐   │
//!                    │  │ main task  │◀──────────│shutdown latch│◀──┼── SIGTERM / SIGINT
//!                    │  └────────────┘           └──────────────┘   │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Configured through the environment only; `PROXY_PORT` is the bind port.

use kfserving_proxy::lifecycle::startup;

#[tokio::main]
async fn main() {
    startup::run_from_env().await;
}
