//! Console API, nested under `/console/api`. Every route requires a caller
//! identity.

pub mod market;

use std::sync::Arc;

use axum::{middleware, Router};
use utoipa::OpenApi;

use crate::middleware::auth;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(market::router())
        .route_layer(middleware::from_fn_with_state(state, auth::caller_middleware))
}

pub fn api_docs() -> utoipa::openapi::OpenApi {
    market::MarketApi::openapi()
}
