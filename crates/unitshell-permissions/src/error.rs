//! Error types for authorization

use thiserror::Error;
use unitshell_domain::ShellError;

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authorizing a shell request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential provided")]
    NoCredential,

    #[error("invalid or expired credential: {0}")]
    InvalidCredential(String),

    #[error("{subject} lacks {scheme} on app {app}")]
    PermissionDenied {
        subject: String,
        scheme: String,
        app: String,
    },

    #[error("app {0} not found")]
    AppNotFound(String),

    #[error("app registry error: {0}")]
    Registry(String),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),

    #[error("failed to issue token: {0}")]
    TokenIssue(String),
}

impl From<AuthError> for ShellError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoCredential => ShellError::NoCredential,
            AuthError::InvalidCredential(_) => ShellError::InvalidCredential,
            AuthError::PermissionDenied { .. } => ShellError::PermissionDenied,
            AuthError::AppNotFound(name) => ShellError::AppNotFound(name),
            AuthError::Registry(reason)
            | AuthError::InvalidPermission(reason)
            | AuthError::TokenIssue(reason) => ShellError::Internal(reason),
        }
    }
}
