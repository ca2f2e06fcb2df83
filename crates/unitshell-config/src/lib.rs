//! UnitShell configuration
//!
//! Loads [`ServerConfig`] from an optional TOML file layered under
//! `UNITSHELL_*` environment variables, then validates it as a whole.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{AppConfig, AuthConfig, BackendConfig, BackendKind, ServerConfig, StaticToken};
