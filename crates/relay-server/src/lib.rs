//! Webhook server and command bridge for grafana-relay.
//!
//! [`RelayServer`] exposes two routes:
//!
//! - `POST /grafana/{token}/alert` relays a Grafana alert to the room of the
//!   instance owning `token`. Answers `OK`, `Forbidden` (unknown token) or
//!   `Internal Error.`
//! - `GET /health` reports the instance count and uptime.
//!
//! The [`bridge`] module feeds chat commands to the same registry over
//! newline-delimited JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use bridge::{BridgeRequest, BridgeResponse};
pub use config::{ChatConfig, RelayConfig, SAMPLE_CONFIG};
pub use error::{ServerError, ServerResult};
pub use handlers::HealthResponse;
pub use routes::create_router;
pub use server::RelayServer;
pub use state::AppState;
