//! Group-scoped attachment routes. All four take a JSON body.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use reqwest::Method;
use serde_json::json;

use super::proxy::{forward, key_path, proxy_body, segment};
use super::AppState;
use crate::coordinator::CoordinatorRequest;
use crate::error::AppResult;

pub async fn upload(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["group_name", "key", "content_length"])?;
    let group = pb.string("group_name");
    let key = pb.take("key");
    let content_length = pb.take("content_length");
    let req = CoordinatorRequest::new(Method::POST, format!("/groups/{}/attachments", segment(&group)))
        .json(json!({ "key": key, "content_length": content_length }));
    forward(&state, &pb.creds, req).await
}

pub async fn download(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &["group_name", "key"])?;
    let path = format!("/groups/{}/download/attachments/{}", segment(&pb.string("group_name")), key_path(&pb.string("key")));
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::GET, path)).await
}

pub async fn query(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    let creds = pb.creds.clone();
    forward(&state, &creds, CoordinatorRequest::new(Method::POST, "/attachments/query").json(pb.into_value())).await
}

pub async fn delete(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &["group_name", "key"])?;
    let path = format!("/groups/{}/attachments/{}", segment(&pb.string("group_name")), key_path(&pb.string("key")));
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::DELETE, path)).await
}
