//! Shared test helpers: a recording mock coordinator served by axum on an
//! ephemeral port, and one-shot calls into the dashboard router.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use coordinator_dashboard::server::{router, AppState};

/// One request as the mock coordinator saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_length: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Clone, Default)]
pub struct MockCoordinator {
    requests: Arc<Mutex<Vec<Recorded>>>,
    replies: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockCoordinator {
    /// Serve on 127.0.0.1 and return the base URL.
    pub async fn start(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock coordinator");
        let addr = listener.local_addr().expect("local addr");
        let app = Router::new().fallback(record).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock coordinator");
        });
        format!("http://{}", addr)
    }

    /// Program the reply for `method path`; unprogrammed calls get 200 `{"ok":true}`.
    pub fn reply(&self, method: &str, path: &str, status: u16, body: &str) {
        self.replies.lock().insert((method.to_string(), path.to_string()), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().last().cloned().expect("mock coordinator saw no request")
    }
}

async fn record(State(mock): State<MockCoordinator>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header_str = |name: header::HeaderName| parts.headers.get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    let rec = Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(|q| q.to_string()),
        authorization: header_str(header::AUTHORIZATION),
        content_length: header_str(header::CONTENT_LENGTH),
        body: bytes.to_vec(),
    };
    let key = (rec.method.clone(), rec.path.clone());
    mock.requests.lock().push(rec);
    let programmed = mock.replies.lock().get(&key).cloned();
    let (status, body) = programmed.unwrap_or((200, r#"{"ok":true}"#.to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if body.is_empty() {
        return status.into_response();
    }
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// An address nothing listens on.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn dashboard() -> Router {
    router(AppState::default())
}

/// Send one request to a fresh dashboard router; returns status and parsed JSON body.
pub async fn call(method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(b) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(b.to_string())
        }
        None => Body::empty(),
    };
    let response = dashboard().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
    call("POST", uri, Some(&body.to_string())).await
}

/// Percent-encode a value for use in a test query string.
pub fn enc(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
