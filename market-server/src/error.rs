//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** Internal errors (Database, Internal) are logged with full
//! detail but only a generic message is returned to the caller so that SQL or
//! other implementation details never leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// All errors that can occur in the market-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body or query failed field validation.
    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// No usable caller identity was presented.
    #[error("unauthorised: {0}")]
    Unauthorized(String),

    /// The caller is known but lacks the role or ownership required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A draft workflow being published contains an `app-caller` node.
    #[error("workflow contains an app-caller node")]
    WorkflowContainsAppCaller,

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ServerError::Forbidden(m) => {
                warn!(reason = %m, "request forbidden");
                (StatusCode::FORBIDDEN, "forbidden".to_owned())
            }
            ServerError::WorkflowContainsAppCaller => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }

            // Internal errors: log the full detail, keep it private.
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_expose_their_message() {
        let (status, body) = body_json(ServerError::NotFound("listing x not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "listing x not found");
    }

    #[tokio::test]
    async fn internal_errors_are_masked() {
        let (status, body) = body_json(ServerError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn forbidden_hides_the_reason() {
        let (status, body) = body_json(ServerError::Forbidden("not the creator".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }
}
