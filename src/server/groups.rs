//! Group membership routes.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Response;
use reqwest::Method;
use serde_json::json;

use super::proxy::{forward, proxy_body, query_credentials, segment, Path};
use super::AppState;
use crate::coordinator::CoordinatorRequest;
use crate::error::AppResult;

pub async fn create(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["group_name"])?;
    let group_name = pb.take("group_name");
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::POST, "/groups").json(json!({ "group_name": group_name }))).await
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(group_name): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    forward(&state, &creds, CoordinatorRequest::new(Method::GET, format!("/groups/{}", segment(&group_name)))).await
}

/// Upsert user roles; `relations` maps username to role.
pub async fn update_users(State(state): State<AppState>, Path(group_name): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["relations"])?;
    let relations = pb.take("relations");
    let req = CoordinatorRequest::new(Method::PUT, format!("/groups/{}/users", segment(&group_name))).json(json!({ "relations": relations }));
    forward(&state, &pb.creds, req).await
}

/// `users` is a comma-separated list in the query string.
pub async fn remove_users(
    State(state): State<AppState>,
    Path(group_name): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &["users"])?;
    let users = split_users(q.get("users").map(|s| s.as_str()).unwrap_or_default());
    let req = CoordinatorRequest::new(Method::DELETE, format!("/groups/{}/users", segment(&group_name))).json(json!({ "users": users }));
    forward(&state, &creds, req).await
}

/// `POST /api/users/groups` -> `GET /users/groups`: groups the caller belongs to.
pub async fn my_groups(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::GET, "/users/groups")).await
}

fn split_users(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).map(|s| s.to_string()).collect()
}
