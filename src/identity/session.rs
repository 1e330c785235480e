use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::coordinator_addr::normalize_coordinator_url;

pub type SessionToken = String;

/// Default lifetime of a stored session.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// A logged-in operator and the coordinator they authenticated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub token: SessionToken,
    /// Always an origin (`scheme://host[:port]`), see `normalize_coordinator_url`.
    pub coordinator_addr: String,
    pub login_time: DateTime<Utc>,
    pub retain: bool,
}

impl Session {
    pub fn new(username: &str, token: &str, coordinator_addr: &str, retain: bool) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
            coordinator_addr: normalize_coordinator_url(coordinator_addr),
            login_time: Utc::now(),
            retain,
        }
    }

    pub fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            // A deadline beyond chrono's range never arrives.
            Some(ttl) => self.login_time.checked_add_signed(ttl).is_some_and(|deadline| deadline <= now),
            None => false,
        }
    }
}

/// Holds the current session in memory and, for retained sessions, on disk.
///
/// The memory slot plays the part of per-tab storage: it survives until the
/// process exits. Retained sessions are also written as JSON so a later
/// process picks them up.
pub struct SessionStore {
    path: Option<PathBuf>,
    ttl: Option<Duration>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self { path: Some(path.into()), ttl, current: RwLock::new(None) }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(ttl: Option<Duration>) -> Self {
        Self { path: None, ttl, current: RwLock::new(None) }
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn save(&self, session: &Session) -> Result<()> {
        *self.current.write() = Some(session.clone());
        let Some(path) = self.path.as_deref() else { return Ok(()); };
        if session.retain {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("While creating session directory {}", parent.display()))?;
                }
            }
            let text = serde_json::to_string_pretty(session)?;
            std::fs::write(path, text).with_context(|| format!("While writing session file {}", path.display()))?;
            debug!(target: "session", "session for {} persisted to {}", session.username, path.display());
        } else {
            // A non-retained login replaces any earlier retained one.
            remove_if_present(path)?;
        }
        Ok(())
    }

    /// Returns the saved session, or `None` when there is none or it has expired.
    pub fn load(&self) -> Result<Option<Session>> {
        let cached = self.current.read().clone();
        let found = match cached {
            Some(s) => Some(s),
            None => self.read_file(),
        };
        let Some(session) = found else { return Ok(None); };
        if session.is_expired(self.ttl, Utc::now()) {
            info!(target: "session", "session for {} expired (login_time={})", session.username, session.login_time);
            self.clear()?;
            return Ok(None);
        }
        *self.current.write() = Some(session.clone());
        Ok(Some(session))
    }

    pub fn clear(&self) -> Result<()> {
        *self.current.write() = None;
        if let Some(path) = self.path.as_deref() {
            remove_if_present(path)?;
        }
        Ok(())
    }

    fn read_file(&self) -> Option<Session> {
        let path = self.path.as_deref()?;
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(target: "session", "cannot read session file {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Session>(&text) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(target: "session", "ignoring corrupt session file {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("While removing session file {}", path.display())),
    }
}
