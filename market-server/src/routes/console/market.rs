//! Marketplace listing endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

use crate::error::ServerError;
use crate::identity::Caller;
use crate::schemas::console::market::{
    CreateMarketAppRequest, ListMarketAppsQuery, MarketAppPaginationResponse, MarketAppResponse,
    PatchMarketAppRequest, ResultResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_market_apps, create_market_app, patch_market_app, delete_market_app, transfer_market_app),
    components(schemas(
        CreateMarketAppRequest,
        PatchMarketAppRequest,
        MarketAppResponse,
        MarketAppPaginationResponse,
        ResultResponse,
    ))
)]
pub struct MarketApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-apps", get(list_market_apps).post(create_market_app))
        .route(
            "/market-apps/{id}",
            axum::routing::patch(patch_market_app)
                .delete(delete_market_app)
                .post(transfer_market_app),
        )
}

#[utoipa::path(
    get,
    path = "/console/api/market-apps",
    tag = "market-apps",
    params(ListMarketAppsQuery),
    responses(
        (status = 200, description = "One page of active listings", body = MarketAppPaginationResponse),
        (status = 400, description = "Invalid paging or mode"),
        (status = 401, description = "Missing caller identity"),
    )
)]
pub async fn list_market_apps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMarketAppsQuery>,
) -> Result<Json<MarketAppPaginationResponse>, ServerError> {
    query.validate()?;
    let filter = query.filter()?;
    let page = state.market().list(&filter, query.page, query.limit).await?;
    Ok(Json(page.to_response()))
}

/// Publish a studio app. A draft workflow holding an app-caller node is a
/// soft failure: 200 with `{"result": "app_caller_error"}`.
#[utoipa::path(
    post,
    path = "/console/api/market-apps",
    tag = "market-apps",
    request_body = CreateMarketAppRequest,
    responses(
        (status = 201, description = "Listing created", body = ResultResponse),
        (status = 200, description = "Workflow contains an app-caller node", body = ResultResponse),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Caller may not publish"),
        (status = 404, description = "Source app, workflow or configuration not found"),
    )
)]
pub async fn create_market_app(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateMarketAppRequest>,
) -> Result<Response, ServerError> {
    req.validate()?;
    match state.market().create(&caller, req.into()).await {
        Ok(listing) => {
            let body = ResultResponse {
                id: Some(listing.id),
                ..ResultResponse::success()
            };
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        Err(ServerError::WorkflowContainsAppCaller) => {
            info!(account_id = %caller.account_id, "publish refused: app-caller node in workflow");
            Ok(Json(ResultResponse::app_caller_error()).into_response())
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    patch,
    path = "/console/api/market-apps/{id}",
    tag = "market-apps",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = PatchMarketAppRequest,
    responses(
        (status = 200, description = "Listing updated", body = ResultResponse),
        (status = 403, description = "Caller is neither admin nor creator"),
        (status = 404, description = "Listing not found"),
    )
)]
pub async fn patch_market_app(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchMarketAppRequest>,
) -> Result<Json<ResultResponse>, ServerError> {
    req.validate()?;
    state.market().patch(&caller, &id.to_string(), req.into()).await?;
    Ok(Json(ResultResponse::success()))
}

#[utoipa::path(
    delete,
    path = "/console/api/market-apps/{id}",
    tag = "market-apps",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing retired", body = ResultResponse),
        (status = 403, description = "Caller is neither admin nor creator"),
        (status = 404, description = "Listing not found"),
    )
)]
pub async fn delete_market_app(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultResponse>, ServerError> {
    state.market().delete(&caller, &id.to_string()).await?;
    Ok(Json(ResultResponse::success()))
}

/// Install a listing into the caller's studio.
#[utoipa::path(
    post,
    path = "/console/api/market-apps/{id}",
    tag = "market-apps",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Studio app created", body = ResultResponse),
        (status = 404, description = "No active listing with this id"),
    )
)]
pub async fn transfer_market_app(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultResponse>, ServerError> {
    let app = state.market().transfer_to_studio(&caller, &id.to_string()).await?;
    Ok(Json(ResultResponse {
        app_id: Some(app.id),
        ..ResultResponse::success()
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::entities::{
        testing, AnyStore, AppMode, ModelConfigRecord, ModelConfigs, ModelSettings, Organizations,
        WorkflowRecord, Workflows,
    };
    use crate::events::EventBus;
    use crate::routes;
    use axum::body::Body;
    use axum::http::Request;
    use clap::Parser;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn state(args: &[&str]) -> Arc<AppState> {
        let store = testing::store().await;
        let config = Config::try_parse_from(args.iter().copied()).unwrap();
        Arc::new(AppState {
            config: Arc::new(config),
            store: Arc::new(store),
            events: EventBus::new(8),
        })
    }

    async fn seed(store: &AnyStore) {
        testing::insert_app(store, &testing::app("chat-app", "tenant-a", AppMode::Chat)).await;
        testing::insert_app(store, &testing::app("flow-app", "tenant-a", AppMode::AdvancedChat)).await;
        let mut tx = store.begin().await.unwrap();
        Organizations::join(&mut tx, "org-1", "acc-1").await.unwrap();
        ModelConfigs::insert(
            &mut tx,
            &ModelConfigRecord {
                id: "cfg-1".into(),
                app_id: "chat-app".into(),
                settings: ModelSettings {
                    pre_prompt: Some("be helpful".into()),
                    ..Default::default()
                },
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        Workflows::insert(
            &mut tx,
            &WorkflowRecord {
                id: "wf-1".into(),
                tenant_id: "tenant-a".into(),
                app_id: "flow-app".into(),
                kind: "chat".into(),
                version: WorkflowRecord::DRAFT_VERSION.into(),
                graph: r#"{"nodes":[{"id":"1","data":{"type":"app-caller"}}]}"#.into(),
                features: "{}".into(),
                app_caller_nodes: None,
                created_by: "acc-1".into(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-account-id", "acc-1")
            .header("x-tenant-id", "tenant-a")
            .header("x-account-roles", "MANAGER");
        match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
        let response = routes::build(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn publish_list_and_install() {
        let state = state(&["market-server"]).await;
        seed(&state.store).await;

        let (status, body) = call(
            &state,
            request(
                "POST",
                "/console/api/market-apps",
                Some(json!({ "app_id": "chat-app", "name": "Helper", "hashcode": ["faq"], "important": 3 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["result"], "success");
        let id = body["id"].as_str().unwrap().to_owned();

        let (status, body) = call(
            &state,
            request("GET", "/console/api/market-apps?mode=all&search=faq", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let (_, body) = call(&state, request("GET", "/console/api/market-apps?mode=workflow", None)).await;
        assert_eq!(body["total"], 0);

        // Tags match whole values, so surrounding spaces are significant.
        let (_, body) = call(&state, request("GET", "/console/api/market-apps?search=faq%20", None)).await;
        assert_eq!(body["total"], 0);

        let (status, _) = call(&state, request("GET", "/console/api/market-apps?mode=All", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&state, request("GET", "/console/api/market-apps?search=help", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["has_more"], false);
        assert_eq!(body["data"][0]["id"], id.as_str());
        assert_eq!(body["data"][0]["hashcode"], json!(["faq"]));

        let (status, body) = call(&state, request("POST", &format!("/console/api/market-apps/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "success");
        assert!(body["app_id"].is_string());
    }

    #[tokio::test]
    async fn app_caller_workflow_is_a_soft_failure() {
        let state = state(&["market-server"]).await;
        seed(&state.store).await;

        let (status, body) = call(
            &state,
            request(
                "POST",
                "/console/api/market-apps",
                Some(json!({ "app_id": "flow-app", "name": "Router" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": "app_caller_error" }));

        let (_, body) = call(&state, request("GET", "/console/api/market-apps", None)).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn patch_then_delete() {
        let state = state(&["market-server"]).await;
        seed(&state.store).await;
        let (_, body) = call(
            &state,
            request(
                "POST",
                "/console/api/market-apps",
                Some(json!({ "app_id": "chat-app", "name": "Helper" })),
            ),
        )
        .await;
        let uri = format!("/console/api/market-apps/{}", body["id"].as_str().unwrap());

        let (status, _) = call(&state, request("PATCH", &uri, Some(json!({ "name": "Renamed" })))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&state, request("GET", "/console/api/market-apps", None)).await;
        assert_eq!(body["data"][0]["name"], "Renamed");

        let (status, body) = call(&state, request("DELETE", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "success");
        let (_, body) = call(&state, request("GET", "/console/api/market-apps", None)).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let state = state(&["market-server"]).await;

        let (status, _) = call(&state, request("GET", "/console/api/market-apps?limit=500", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&state, request("GET", "/console/api/market-apps?mode=voice", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            request("POST", "/console/api/market-apps", Some(json!({ "app_id": "x", "name": "" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            request("DELETE", &format!("/console/api/market-apps/{}", Uuid::new_v4()), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn identity_and_gateway_token_are_required() {
        let state = state(&["market-server", "--gateway-token", "secret"]).await;

        let anonymous = Request::builder()
            .uri("/console/api/market-apps")
            .header("authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&state, anonymous).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&state, request("GET", "/console/api/market-apps", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut with_token = request("GET", "/console/api/market-apps", None);
        with_token
            .headers_mut()
            .insert("authorization", "Bearer secret".parse().unwrap());
        let (status, _) = call(&state, with_token).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &state,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
