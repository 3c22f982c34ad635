use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .as_deref()
        .map(|raw| raw.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        // Wildcard; set MARKET_CORS_ORIGINS in production.
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
