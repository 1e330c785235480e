//! Runtime configuration for the server and the operator CLI.
//!
//! Resolution order for every setting: explicit command-line value, then the
//! environment variable, then the built-in default.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Duration;

use crate::identity::DEFAULT_SESSION_TTL_HOURS;

pub const ENV_BIND: &str = "DASHBOARD_BIND";
pub const ENV_HTTP_PORT: &str = "DASHBOARD_HTTP_PORT";
pub const ENV_SESSION_FILE: &str = "DASHCTL_SESSION_FILE";
pub const ENV_SESSION_TTL_HOURS: &str = "DASHCTL_SESSION_TTL_HOURS";

pub const DEFAULT_HTTP_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), http_port: DEFAULT_HTTP_PORT }
    }
}

impl ServerConfig {
    pub fn resolve(arg_bind: Option<IpAddr>, arg_port: Option<u16>) -> Self {
        let defaults = Self::default();
        let env_bind = env::var(ENV_BIND).ok().and_then(|v| v.trim().parse::<IpAddr>().ok());
        let env_port = parse_env::<u16>(ENV_HTTP_PORT);
        Self {
            bind_addr: arg_bind.or(env_bind).unwrap_or(defaults.bind_addr),
            http_port: arg_port.or(env_port).unwrap_or(defaults.http_port),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.bind_addr, self.http_port) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub session_file: PathBuf,
    /// `None` disables expiry.
    pub session_ttl: Option<Duration>,
}

impl ClientConfig {
    pub fn resolve(arg_file: Option<PathBuf>, arg_ttl_hours: Option<i64>) -> Result<Self> {
        let env_file = env::var(ENV_SESSION_FILE).ok().filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        let env_ttl = parse_env::<i64>(ENV_SESSION_TTL_HOURS);
        let hours = arg_ttl_hours.or(env_ttl).unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        Ok(Self {
            session_file: arg_file.or(env_file).unwrap_or_else(default_session_file),
            session_ttl: ttl_from_hours(hours)?,
        })
    }
}

/// `<config dir>/coordinator-dashboard/session.json`, or the working directory
/// when the platform reports no config dir.
pub fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coordinator-dashboard")
        .join("session.json")
}

/// Zero or negative disables expiry; values past chrono's range are rejected.
pub fn ttl_from_hours(hours: i64) -> Result<Option<Duration>> {
    if hours <= 0 {
        return Ok(None);
    }
    match Duration::try_hours(hours) {
        Some(ttl) => Ok(Some(ttl)),
        None => bail!("session ttl of {} hours is out of range", hours),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(val) => val.trim().parse::<T>().ok(),
        Err(_) => None,
    }
}
