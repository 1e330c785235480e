//! Login, token verification and password change.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use super::proxy::{forward, forward_anonymous, login_body, proxy_body, segment};
use super::AppState;
use crate::coordinator::CoordinatorRequest;
use crate::error::AppResult;
use crate::identity::normalize_coordinator_url;

/// `POST /api/auth/login` -> `POST /login`. The coordinator answers with the token.
pub async fn login(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let (addr, fields) = login_body(&body, &["username", "password"])?;
    let username = fields.get("username").cloned().unwrap_or(Value::Null);
    let retain = matches!(fields.get("retain"), Some(Value::Bool(true)));
    info!(target: "proxy", "login attempt user={} coordinator={}", username, normalize_coordinator_url(&addr));
    let req = CoordinatorRequest::new(Method::POST, "/login").json(json!({
        "username": username,
        "password": fields.get("password").cloned().unwrap_or(Value::Null),
        "retain": retain,
    }));
    forward_anonymous(&state, &addr, req).await
}

/// `POST /api/auth/verify` -> `GET /auth`.
pub async fn verify(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::GET, "/auth")).await
}

/// `POST /api/auth/change-password` -> `POST /users/{username}/password`.
pub async fn change_password(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["username", "old_password", "new_password"])?;
    let username = pb.string("username");
    let old_password = pb.take("old_password");
    let new_password = pb.take("new_password");
    let req = CoordinatorRequest::new(Method::POST, format!("/users/{}/password", segment(&username)))
        .json(json!({ "old_password": old_password, "new_password": new_password }));
    forward(&state, &pb.creds, req).await
}
