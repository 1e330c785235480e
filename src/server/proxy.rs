//! The pass-through contract shared by every API route.
//!
//! A handler pulls `token` and `coordinator_addr` (plus any route-specific
//! fields) out of the JSON body or query string, builds one
//! `CoordinatorRequest`, and hands it to `forward`, which relays the outcome.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::AppState;
use crate::coordinator::{CoordinatorReply, CoordinatorRequest};
use crate::error::{AppError, AppResult};
pub use crate::identity::{key_path, segment};

pub const TOKEN: &str = "token";
pub const COORDINATOR_ADDR: &str = "coordinator_addr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub coordinator_addr: String,
}

/// A POST body with the credentials split off; `fields` is what is left.
#[derive(Debug, Clone)]
pub struct ProxyBody {
    pub creds: Credentials,
    pub fields: Map<String, Value>,
}

impl ProxyBody {
    /// The remaining fields as a coordinator request body.
    pub fn into_value(self) -> Value { Value::Object(self.fields) }

    pub fn take(&mut self, name: &str) -> Value { self.fields.remove(name).unwrap_or(Value::Null) }

    pub fn string(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Parse a request body into a JSON object. Malformed JSON is a local failure
/// (500); well-formed JSON that is not an object simply has no fields.
pub fn parse_object(body: &[u8]) -> AppResult<Map<String, Value>> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn is_present(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn missing_fields<'a>(fields: &Map<String, Value>, names: &[&'a str]) -> Vec<&'a str> {
    names.iter().copied().filter(|n| !is_present(fields.get(*n))).collect()
}

/// Body-carrying routes: credentials plus `extra` are all required.
pub fn proxy_body(body: &[u8], extra: &[&str]) -> AppResult<ProxyBody> {
    let mut fields = parse_object(body)?;
    let mut required = vec![TOKEN, COORDINATOR_ADDR];
    required.extend_from_slice(extra);
    let missing = missing_fields(&fields, &required);
    if !missing.is_empty() {
        return Err(AppError::missing(&missing));
    }
    let token = value_to_string(fields.remove(TOKEN));
    let coordinator_addr = value_to_string(fields.remove(COORDINATOR_ADDR));
    Ok(ProxyBody { creds: Credentials { token, coordinator_addr }, fields })
}

/// Login carries no token yet: only the address and `extra` are required.
pub fn login_body(body: &[u8], extra: &[&str]) -> AppResult<(String, Map<String, Value>)> {
    let mut fields = parse_object(body)?;
    let mut required = vec![COORDINATOR_ADDR];
    required.extend_from_slice(extra);
    let missing = missing_fields(&fields, &required);
    if !missing.is_empty() {
        return Err(AppError::missing(&missing));
    }
    let addr = value_to_string(fields.remove(COORDINATOR_ADDR));
    fields.remove(TOKEN);
    Ok((addr, fields))
}

/// Query-string routes (GET / DELETE).
pub fn query_credentials(query: &HashMap<String, String>, extra: &[&str]) -> AppResult<Credentials> {
    let mut required = vec![TOKEN, COORDINATOR_ADDR];
    required.extend_from_slice(extra);
    let missing: Vec<&str> = required
        .into_iter()
        .filter(|n| query.get(*n).map(|v| v.is_empty()).unwrap_or(true))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::missing(&missing));
    }
    Ok(Credentials {
        token: query.get(TOKEN).cloned().unwrap_or_default(),
        coordinator_addr: query.get(COORDINATOR_ADDR).cloned().unwrap_or_default(),
    })
}

pub fn query_flag(query: &HashMap<String, String>, name: &str) -> bool {
    query.get(name).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(false)
}

fn value_to_string(v: Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// `axum::extract::Path` whose rejection is reported as an `{error}` JSON body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Send one request with the caller's bearer token and relay the reply.
pub async fn forward(state: &AppState, creds: &Credentials, req: CoordinatorRequest) -> AppResult<Response> {
    let span = info_span!("proxy", request_id = %Uuid::new_v4(), method = %req.method, path = %req.path);
    async {
        let reply = state.coordinator.send(&creds.coordinator_addr, req.bearer(creds.token.clone())).await?;
        Ok::<Response, AppError>(relay(reply))
    }
    .instrument(span)
    .await
}

/// Forward without a bearer token (login).
pub async fn forward_anonymous(state: &AppState, addr: &str, req: CoordinatorRequest) -> AppResult<Response> {
    let span = info_span!("proxy", request_id = %Uuid::new_v4(), method = %req.method, path = %req.path);
    async {
        let reply = state.coordinator.send(addr, req).await?;
        Ok::<Response, AppError>(relay(reply))
    }
    .instrument(span)
    .await
}

/// Turn a coordinator success into a 200 carrying the same bytes.
pub fn relay(reply: CoordinatorReply) -> Response {
    if reply.body.is_empty() {
        return (StatusCode::OK, Json(serde_json::json!({}))).into_response();
    }
    let content_type = reply
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], reply.body).into_response()
}
