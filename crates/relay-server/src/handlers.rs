//! HTTP request handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServerResult;
use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Registered instances.
    pub instances: usize,
    /// Seconds since startup.
    pub uptime_secs: u64,
}

/// `POST /grafana/{token}/alert`
///
/// Any body is accepted. An unknown token yields 403, a relay failure 500.
pub async fn alert_webhook(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> ServerResult<&'static str> {
    let delivery = state.dispatcher().handle_alert(&token, &body).await?;
    debug!(?delivery, "alert relayed");
    Ok("OK")
}

/// `GET /health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let instances = state.registry().read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        instances,
        uptime_secs: state.uptime_secs(),
    })
}
