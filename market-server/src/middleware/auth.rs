use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::identity::Caller;
use crate::state::AppState;

/// Resolve the [`Caller`] for console routes and store it in the request
/// extensions. When a gateway token is configured the request must also carry
/// it as a bearer token.
pub async fn caller_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = &state.config.gateway_token {
        let provided = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected.as_str()) {
            return ServerError::Unauthorized("invalid gateway token".into()).into_response();
        }
    }

    match Caller::from_headers(req.headers()) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
