//! Configuration manager implementation

use std::collections::HashSet;
use std::path::PathBuf;

use config::{Config, Environment, File};
use tracing::debug;
use unitshell_permissions::Permission;

use crate::{
    error::{ConfigError, Result},
    types::{BackendKind, ServerConfig},
};

const DEFAULT_ENV_PREFIX: &str = "UNITSHELL";
const DEFAULT_CONFIG_FILE: &str = "unitshell.toml";

/// Loads and validates [`ServerConfig`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Whether the file must exist
    required: bool,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Look for `unitshell.toml` in the working directory, if present
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            required: false,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Load from an explicit file, which must exist
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            required: true,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Change the environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the file and environment layers, then validate the result.
    ///
    /// Environment variables look like `UNITSHELL_BIND` or
    /// `UNITSHELL_AUTH__JWT_SECRET` and win over the file.
    pub fn load(&self) -> Result<ServerConfig> {
        if self.required && !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.display().to_string()));
        }

        let config = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(self.required))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        Self::validate(&server_config)?;
        debug!(
            path = %self.config_path.display(),
            apps = server_config.apps.len(),
            "Configuration loaded"
        );
        Ok(server_config)
    }

    /// Check cross-field constraints
    pub fn validate(config: &ServerConfig) -> Result<()> {
        config.bind_addr()?;

        if config.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let has_jwt = config
            .auth
            .jwt_secret
            .as_deref()
            .is_some_and(|secret| !secret.is_empty());
        if !has_jwt && config.auth.tokens.is_empty() {
            return Err(ConfigError::Validation(
                "auth needs a jwt_secret or at least one static token".to_string(),
            ));
        }

        let mut seen_tokens = HashSet::new();
        for token in &config.auth.tokens {
            if token.token.is_empty() || token.subject.is_empty() {
                return Err(ConfigError::Validation(
                    "static tokens need a token and a subject".to_string(),
                ));
            }
            if !seen_tokens.insert(token.token.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate static token for subject {}",
                    token.subject
                )));
            }
            for permission in &token.permissions {
                permission.parse::<Permission>().map_err(|e| {
                    ConfigError::Validation(format!("subject {}: {e}", token.subject))
                })?;
            }
        }

        if config.backend.kind == BackendKind::Local && config.backend.shell.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.shell must name a command".to_string(),
            ));
        }

        let mut app_names = HashSet::new();
        let mut unit_ids = HashSet::new();
        for app in &config.apps {
            if app.name.trim().is_empty() {
                return Err(ConfigError::Validation("app names must not be empty".to_string()));
            }
            if !app_names.insert(app.name.as_str()) {
                return Err(ConfigError::Validation(format!("duplicate app {}", app.name)));
            }
            for unit in &app.units {
                if unit.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "app {} has an empty unit id",
                        app.name
                    )));
                }
                if !unit_ids.insert(unit.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "unit {unit} is listed more than once"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
