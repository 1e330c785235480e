//! Presigned-URL file transfer.
//!
//! Uploads are two sequential calls: ask the coordinator for a presigned URL,
//! then PUT the bytes straight to storage. Downloads mirror that with a GET.
//! There is no chunking or resume; a failed transfer is simply reported.

use std::fmt::{Display, Formatter};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::coordinator::{CoordinatorClient, CoordinatorRequest};
use crate::error::AppError;
use crate::identity::{key_path, segment, Session, SessionStore};

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("coordinator: {0}")]
    Coordinator(#[from] AppError),

    #[error("storage replied HTTP {status}: {body}")]
    Storage { status: u16, body: String },

    #[error("transfer failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected coordinator reply: {0}")]
    InvalidReply(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not logged in; run `dashctl login` first")]
    NotLoggedIn,

    #[error("session expired; please log in again")]
    SessionExpired,

    #[error("session store: {0}")]
    Store(String),
}

impl TransferError {
    /// True when the coordinator refused the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransferError::Coordinator(e) if e.is_unauthorized())
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

/// The three artifact slots a task can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactContentType {
    Result,
    ExecLog,
    StdLog,
}

impl ArtifactContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactContentType::Result => "result",
            ArtifactContentType::ExecLog => "exec-log",
            ArtifactContentType::StdLog => "std-log",
        }
    }
}

impl Display for ArtifactContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for ArtifactContentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "result" => Ok(ArtifactContentType::Result),
            "exec-log" | "exec_log" => Ok(ArtifactContentType::ExecLog),
            "std-log" | "std_log" => Ok(ArtifactContentType::StdLog),
            other => Err(format!("unknown artifact content type '{}' (expected result, exec-log or std-log)", other)),
        }
    }
}

/// What a transfer is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTarget {
    Artifact { uuid: String, content_type: ArtifactContentType },
    Attachment { group_name: String, key: String },
}

impl TransferTarget {
    fn upload_request(&self, content_length: u64) -> CoordinatorRequest {
        match self {
            TransferTarget::Artifact { uuid, content_type } => {
                CoordinatorRequest::new(Method::POST, format!("/tasks/{}/artifacts", segment(uuid)))
                    .json(json!({ "content_type": content_type, "content_length": content_length }))
            }
            TransferTarget::Attachment { group_name, key } => {
                CoordinatorRequest::new(Method::POST, format!("/groups/{}/attachments", segment(group_name)))
                    .json(json!({ "key": key, "content_length": content_length }))
            }
        }
    }

    fn download_request(&self) -> CoordinatorRequest {
        match self {
            TransferTarget::Artifact { uuid, content_type } => CoordinatorRequest::new(
                Method::GET,
                format!("/tasks/{}/download/artifacts/{}", segment(uuid), content_type.as_str()),
            ),
            TransferTarget::Attachment { group_name, key } => CoordinatorRequest::new(
                Method::GET,
                format!("/groups/{}/download/attachments/{}", segment(group_name), key_path(key)),
            ),
        }
    }
}

impl Display for TransferTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferTarget::Artifact { uuid, content_type } => write!(f, "artifact {}/{}", uuid, content_type),
            TransferTarget::Attachment { group_name, key } => write!(f, "attachment {}:{}", group_name, key),
        }
    }
}

/// Coordinator reply carrying a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

pub async fn upload(
    client: &CoordinatorClient,
    session: &Session,
    target: &TransferTarget,
    bytes: Vec<u8>,
) -> TransferResult<PresignedUrl> {
    let content_length = bytes.len() as u64;
    let reply = client
        .send(&session.coordinator_addr, target.upload_request(content_length).bearer(session.token.clone()))
        .await?;
    let presigned: PresignedUrl = reply
        .json()
        .map_err(|e| TransferError::InvalidReply(format!("{}: {}", e.message(), String::from_utf8_lossy(&reply.body))))?;
    debug!(target: "transfer", "presigned upload for {} -> {}", target, presigned.url);

    let resp = client
        .http()
        // A Vec body is sent with a Content-Length equal to its size.
        .put(&presigned.url)
        .body(bytes)
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TransferError::Storage { status: status.as_u16(), body });
    }
    info!(target: "transfer", "uploaded {} bytes for {}", content_length, target);
    Ok(presigned)
}

pub async fn download(client: &CoordinatorClient, session: &Session, target: &TransferTarget) -> TransferResult<Vec<u8>> {
    let reply = client
        .send(&session.coordinator_addr, target.download_request().bearer(session.token.clone()))
        .await?;
    let presigned: PresignedUrl = reply
        .json()
        .map_err(|e| TransferError::InvalidReply(format!("{}: {}", e.message(), String::from_utf8_lossy(&reply.body))))?;
    debug!(target: "transfer", "presigned download for {} -> {}", target, presigned.url);

    let resp = client.http().get(&presigned.url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TransferError::Storage { status: status.as_u16(), body });
    }
    let bytes = resp.bytes().await?.to_vec();
    info!(target: "transfer", "downloaded {} bytes for {}", bytes.len(), target);
    Ok(bytes)
}

/// The stored session, if one is present and unexpired.
pub fn current_session(store: &SessionStore) -> TransferResult<Session> {
    store
        .load()
        .map_err(|e| TransferError::Store(format!("{:#}", e)))?
        .ok_or(TransferError::NotLoggedIn)
}

/// A coordinator 401 means the stored token is dead: clear the session and
/// report `SessionExpired`. Other outcomes pass through untouched.
pub fn expire_on_unauthorized<T>(store: &SessionStore, result: TransferResult<T>) -> TransferResult<T> {
    match result {
        Err(err) if err.is_unauthorized() => {
            info!(target: "session", "coordinator rejected the stored token: {}", err);
            if let Err(e) = store.clear() {
                warn!(target: "session", "failed to clear expired session: {:#}", e);
            }
            Err(TransferError::SessionExpired)
        }
        other => other,
    }
}

/// `upload` with the session taken from `store`.
pub async fn upload_with_store(
    client: &CoordinatorClient,
    store: &SessionStore,
    target: &TransferTarget,
    bytes: Vec<u8>,
) -> TransferResult<PresignedUrl> {
    let session = current_session(store)?;
    expire_on_unauthorized(store, upload(client, &session, target, bytes).await)
}

/// `download` with the session taken from `store`.
pub async fn download_with_store(
    client: &CoordinatorClient,
    store: &SessionStore,
    target: &TransferTarget,
) -> TransferResult<Vec<u8>> {
    let session = current_session(store)?;
    expire_on_unauthorized(store, download(client, &session, target).await)
}
