//! Route configuration for the webhook server.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::{Span, info_span};

use crate::handlers::{alert_webhook, health_check};
use crate::state::AppState;

/// Creates the webhook router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/grafana/{token}/alert", post(alert_webhook))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Request span keyed by the route template. The alert path carries the
/// instance token, so the concrete URI is never recorded.
fn request_span(request: &Request<Body>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str);
    info_span!("http_request", method = %request.method(), route)
}
