//! Administrator routes.
//!
//! The user-listing endpoints are served from fixed sample data rather than the
//! coordinator; every such call is logged at `warn` so nobody mistakes the
//! output for real accounts.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::proxy::{forward, proxy_body, query_credentials, query_flag, segment, Path};
use super::workers::cancel_request;
use super::AppState;
use crate::coordinator::CoordinatorRequest;
use crate::error::{AppError, AppResult};

pub async fn cancel_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    forward(&state, &creds, cancel_request(&format!("/admin/workers/{}", segment(&id)), query_flag(&q, "force"))).await
}

pub async fn set_storage_quota(State(state): State<AppState>, Path(group_name): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["storage_quota"])?;
    let quota = pb.take("storage_quota");
    let req = CoordinatorRequest::new(Method::PUT, format!("/admin/groups/{}/storage-quota", segment(&group_name)))
        .json(json!({ "storage_quota": quota }));
    forward(&state, &pb.creds, req).await
}

pub async fn create_user(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &["username", "password"])?;
    let creds = pb.creds.clone();
    forward(&state, &creds, CoordinatorRequest::new(Method::POST, "/admin/users").json(pb.into_value())).await
}

pub async fn reset_password(State(state): State<AppState>, Path(username): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["new_password"])?;
    let new_password = pb.take("new_password");
    let req = CoordinatorRequest::new(Method::PUT, format!("/admin/users/{}/password", segment(&username)))
        .json(json!({ "new_password": new_password }));
    forward(&state, &pb.creds, req).await
}

pub async fn shutdown(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["secret"])?;
    let secret = pb.take("secret");
    warn!(target: "proxy", "forwarding coordinator shutdown request to {}", pb.creds.coordinator_addr);
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::POST, "/admin/shutdown").json(json!({ "secret": secret }))).await
}

#[derive(Debug, Clone, Serialize)]
pub struct MockUser {
    pub username: &'static str,
    pub state: &'static str,
    pub groups: &'static [&'static str],
    pub created_at: &'static str,
}

const MOCK_USERS: &[MockUser] = &[
    MockUser { username: "admin", state: "Active", groups: &["admin"], created_at: "2024-01-01T00:00:00Z" },
    MockUser { username: "alice", state: "Active", groups: &["alice", "research"], created_at: "2024-02-12T09:30:00Z" },
    MockUser { username: "bob", state: "Locked", groups: &["bob"], created_at: "2024-03-05T16:45:00Z" },
];

const MOCK_GROUPS: &[(&str, &str, u64)] = &[
    ("admin", "Active", 10 * 1024 * 1024 * 1024),
    ("research", "Active", 100 * 1024 * 1024 * 1024),
    ("alice", "Active", 1024 * 1024 * 1024),
    ("bob", "Active", 1024 * 1024 * 1024),
];

fn mock_warning(route: &str) {
    warn!(target: "proxy", "{} returns built-in sample data, not coordinator state", route);
}

pub async fn mock_list_users() -> Json<Value> {
    mock_warning("GET /api/admin/users");
    Json(json!({ "users": MOCK_USERS }))
}

pub async fn mock_list_groups() -> Json<Value> {
    mock_warning("GET /api/admin/users/groups");
    let groups: Vec<Value> = MOCK_GROUPS
        .iter()
        .map(|(name, state, quota)| json!({ "group_name": name, "state": state, "storage_quota": quota }))
        .collect();
    Json(json!({ "groups": groups }))
}

pub async fn mock_get_user(Path(username): Path<String>) -> AppResult<Json<Value>> {
    mock_warning("GET /api/admin/users/{username}");
    MOCK_USERS
        .iter()
        .find(|u| u.username == username)
        .map(|u| Json(json!(u)))
        .ok_or_else(|| AppError::not_found(format!("User {} not found", username)))
}
