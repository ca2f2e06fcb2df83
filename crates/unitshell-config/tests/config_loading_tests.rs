use std::fs;

use tempfile::TempDir;
use unitshell_config::*;

const SAMPLE: &str = r#"
bind = "0.0.0.0:9000"
connect_timeout_secs = 3

[auth]
jwt_secret = "file-secret"

[[auth.tokens]]
token = "ops-token"
subject = "ops"
permissions = ["app.run.shell@team:admins"]

[backend]
kind = "memory"

[[apps]]
name = "someapp"
team_owner = "admins"
units = ["someapp-0", "someapp-1"]
"#;

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unitshell.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_load_from_file() {
    let (_dir, path) = write_config(SAMPLE);
    let config = ConfigManager::with_path(&path)
        .with_env_prefix("USTEST_FILE")
        .load()
        .unwrap();

    assert_eq!(config.bind, "0.0.0.0:9000");
    assert_eq!(config.connect_timeout_secs, 3);
    assert_eq!(config.backend.kind, BackendKind::Memory);
    assert_eq!(config.backend.shell, "/bin/sh");
    assert_eq!(config.auth.tokens[0].subject, "ops");
    assert_eq!(config.apps[0].units, vec!["someapp-0", "someapp-1"]);
    assert_eq!(config.log_filter, "info");
}

#[test]
fn test_environment_overrides_file() {
    let (_dir, path) = write_config(SAMPLE);
    std::env::set_var("USTEST_ENV_BIND", "127.0.0.1:7000");
    std::env::set_var("USTEST_ENV_AUTH__JWT_SECRET", "env-secret");

    let config = ConfigManager::with_path(&path)
        .with_env_prefix("USTEST_ENV")
        .load()
        .unwrap();

    assert_eq!(config.bind, "127.0.0.1:7000");
    assert_eq!(config.auth.jwt_secret.as_deref(), Some("env-secret"));
    assert_eq!(config.apps.len(), 1);
}

#[test]
fn test_invalid_file_fails_validation() {
    let (_dir, path) = write_config(
        r#"
connect_timeout_secs = 0

[auth]
jwt_secret = "secret"
"#,
    );

    let err = ConfigManager::with_path(&path)
        .with_env_prefix("USTEST_INVALID")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let (_dir, path) = write_config("bind = [unterminated");

    let err = ConfigManager::with_path(&path)
        .with_env_prefix("USTEST_MALFORMED")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
