//! Outbound HTTP to the coordinator.
//!
//! Every request the dashboard or the CLI sends to the coordinator goes through
//! `CoordinatorClient::send`, which attaches the bearer token, issues exactly one
//! attempt and sorts the outcome into a success reply or an `AppError`.

use axum::body::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::identity::coordinator_endpoint;

/// One call against the coordinator REST API.
#[derive(Debug, Clone)]
pub struct CoordinatorRequest {
    pub method: Method,
    /// Absolute path on the coordinator, e.g. `/tasks/query`.
    pub path: String,
    pub token: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl CoordinatorRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), token: None, query: Vec::new(), body: None }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_param(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A 2xx reply from the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl CoordinatorReply {
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Clone, Default)]
pub struct CoordinatorClient {
    http: reqwest::Client,
}

impl CoordinatorClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The underlying pool, shared with presigned-URL transfers.
    pub fn http(&self) -> &reqwest::Client { &self.http }

    pub async fn send(&self, addr: &str, req: CoordinatorRequest) -> AppResult<CoordinatorReply> {
        let url = coordinator_endpoint(addr, &req.path);
        let mut builder = self.http.request(req.method.clone(), &url);
        if let Some(token) = req.token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::internal(format!("invalid bearer token: {}", e)))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = req.body.as_ref() {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        debug!(target: "proxy", method = %req.method, url = %url, status = status.as_u16(), "coordinator replied");
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(AppError::coordinator(status.as_u16(), text));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes().await?;
        Ok(CoordinatorReply { status: status.as_u16(), content_type, body })
    }
}
