//! Task submission, lookup and artifact routes.

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

pub async fn submit(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    let creds = pb.creds.clone();
    forward(&state, &creds, CoordinatorRequest::new(Method::POST, "/tasks").json(pb.into_value())).await
}

pub async fn query(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    let creds = pb.creds.clone();
    forward(&state, &creds, CoordinatorRequest::new(Method::POST, "/tasks/query").json(pb.into_value())).await
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    forward(&state, &creds, CoordinatorRequest::new(Method::GET, format!("/tasks/{}", segment(&uuid)))).await
}

pub async fn cancel(State(state): State<AppState>, Path(uuid): Path<String>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    forward(&state, &pb.creds, CoordinatorRequest::new(Method::POST, format!("/tasks/{}/cancel", segment(&uuid)))).await
}

pub async fn update_labels(State(state): State<AppState>, Path(uuid): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["labels"])?;
    let labels = pb.take("labels");
    let req = CoordinatorRequest::new(Method::PUT, format!("/tasks/{}/labels", segment(&uuid))).json(json!({ "labels": labels }));
    forward(&state, &pb.creds, req).await
}

/// Replace a pending task's spec; the remaining body is the new spec.
pub async fn change_spec(State(state): State<AppState>, Path(uuid): Path<String>, body: Bytes) -> AppResult<Response> {
    let pb = proxy_body(&body, &[])?;
    let creds = pb.creds.clone();
    let req = CoordinatorRequest::new(Method::PUT, format!("/tasks/{}", segment(&uuid))).json(pb.into_value());
    forward(&state, &creds, req).await
}

/// Mint a presigned download URL for one artifact.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((uuid, content_type)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    let path = format!("/tasks/{}/download/artifacts/{}", segment(&uuid), segment(&content_type));
    forward(&state, &creds, CoordinatorRequest::new(Method::GET, path)).await
}

pub async fn delete_artifact(
    State(state): State<AppState>,
    Path((uuid, content_type)): Path<(String, String)>,
    Query(q): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    let creds = query_credentials(&q, &[])?;
    let path = format!("/tasks/{}/artifacts/{}", segment(&uuid), segment(&content_type));
    forward(&state, &creds, CoordinatorRequest::new(Method::DELETE, path)).await
}

/// Step one of an artifact upload: the coordinator returns the presigned PUT URL.
pub async fn upload_artifact(State(state): State<AppState>, Path(uuid): Path<String>, body: Bytes) -> AppResult<Response> {
    let mut pb = proxy_body(&body, &["content_type", "content_length"])?;
    let content_type = pb.take("content_type");
    let content_length = pb.take("content_length");
    let req = CoordinatorRequest::new(Method::POST, format!("/tasks/{}/artifacts", segment(&uuid)))
        .json(json!({ "content_type": content_type, "content_length": content_length }));
    forward(&state, &pb.creds, req).await
}
