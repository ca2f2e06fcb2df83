//! Server configuration types

use std::{net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Upper bound on authorization, resolution and shell start
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Tracing filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Credential sources
    #[serde(default)]
    pub auth: AuthConfig,

    /// Unit directory backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Registered applications and their units
    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            connect_timeout_secs: default_connect_timeout_secs(),
            log_filter: default_log_filter(),
            auth: AuthConfig::default(),
            backend: BackendConfig::default(),
            apps: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Validation(format!("invalid bind address {:?}: {e}", self.bind)))
    }

    /// Connection establishment timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Credential sources; at least one must be configured
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// HS256 secret for bearer JWTs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,

    /// Fixed bearer tokens
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

/// A fixed bearer token and the identity behind it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticToken {
    /// Bearer token value
    pub token: String,
    /// Subject the token identifies
    pub subject: String,
    /// Granted permissions, `scheme[@context]`
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Which unit directory runs shells
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local PTY processes
    #[default]
    Local,
    /// In-memory echo shells
    Memory,
}

/// Unit directory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend selection
    #[serde(default)]
    pub kind: BackendKind,

    /// Command the local backend spawns
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            shell: default_shell(),
        }
    }
}

/// A registered application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Application name
    pub name: String,
    /// Owning team
    #[serde(default)]
    pub team_owner: String,
    /// Unit ids, in the order the resolver sees them
    #[serde(default)]
    pub units: Vec<String>,
}

// Default value functions for serde
fn default_bind() -> String {
    "127.0.0.1:8888".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}
