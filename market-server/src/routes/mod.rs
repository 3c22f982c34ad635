//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - Health route
//! - Console `/console/api` routes behind the caller-identity middleware
//! - Optional Swagger UI / OpenAPI document (disable with `MARKET_ENABLE_SWAGGER=false`)
//! - CORS and per-request trace-id layers

mod console;
pub mod doc;
mod health;

use std::sync::Arc;

use axum::{middleware, Router};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/console/api", console::router(state.clone()));

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(cors::cors_layer(&state))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
