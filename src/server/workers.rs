//! Worker routes available to ordinary users.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Response;
use reqwest::Method;
use serde_json::json;

use super::proxy::{forward, proxy_body, query_credentials, query_flag, segment, Path};
use super::AppState;
use crate::coordinator::CoordinatorRequest;
use crate::error::AppResult;

pub async fn query(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    let creds = pb.creds.clone();
    forward(&state, &creds, CoordinatorRequest::new(Method::POST, "/workers/query").json(pb.into_value())).await
}

pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    forward(&state, &creds, CoordinatorRequest::new(Method::GET, format!("/workers/{}", segment(&id)))).await
}

/// `force=true` asks the coordinator to drop the worker without waiting for its task.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    forward(&state, &creds, cancel_request(&format!("/workers/{}", segment(&id)), query_flag(&q, "force"))).await
}

pub async fn replace_tags(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["tags"])?;
    let tags = pb.take("tags");
    let req = CoordinatorRequest::new(Method::PUT, format!("/workers/{}/tags", segment(&id))).json(json!({ "tags": tags }));
    forward(&state, &pb.creds, req).await
}

pub async fn update_groups(State(state): State<AppState>, Path(id): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["relations"])?;
    let relations = pb.take("relations");
    let req = CoordinatorRequest::new(Method::PUT, format!("/workers/{}/groups", segment(&id))).json(json!({ "relations": relations }));
    forward(&state, &pb.creds, req).await
}

pub(crate) fn cancel_request(path: &str, force: bool) -> CoordinatorRequest {
    let req = CoordinatorRequest::new(Method::DELETE, path);
    if force { req.query_param("op", "force") } else { req }
}
