//! Failure taxonomy for shell sessions

use thiserror::Error;

/// Every way a shell session can fail.
///
/// `Display` is the human-readable description shown to the client after
/// the `Error: ` prefix, so the wording of the authorization and lookup
/// variants must not change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("no token provided or session expired, please login again")]
    NoCredential,

    #[error("no token provided or session expired, please login again")]
    InvalidCredential,

    #[error("You don't have permission to do this action")]
    PermissionDenied,

    #[error("App {0} not found.")]
    AppNotFound(String),

    #[error("App {0} has no units available")]
    NoUnitsAvailable(String),

    #[error("Unit {unit} not found for app {app}")]
    UnitNotFound { app: String, unit: String },

    #[error("failed to start shell: {0}")]
    ShellStartFailure(String),

    #[error("stream error: {0}")]
    StreamIo(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("timed out after {0}s establishing the shell session")]
    ConnectTimeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShellError {
    /// The single line written to the client before the connection closes.
    ///
    /// Mid-session stream failures have no message: the socket is past the
    /// point where text can be delivered reliably.
    pub fn client_message(&self) -> Option<String> {
        match self {
            ShellError::StreamIo(_) => None,
            other => Some(format!("Error: {other}\n")),
        }
    }

    /// Short machine-friendly name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ShellError::NoCredential => "no_credential",
            ShellError::InvalidCredential => "invalid_credential",
            ShellError::PermissionDenied => "permission_denied",
            ShellError::AppNotFound(_) => "app_not_found",
            ShellError::NoUnitsAvailable(_) => "no_units_available",
            ShellError::UnitNotFound { .. } => "unit_not_found",
            ShellError::ShellStartFailure(_) => "shell_start_failure",
            ShellError::StreamIo(_) => "stream_io",
            ShellError::InvalidRequest(_) => "invalid_request",
            ShellError::ConnectTimeout(_) => "connect_timeout",
            ShellError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Failures reported by a unit directory backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("unit {0} is unreachable")]
    Unreachable(String),

    #[error("{0}")]
    StartFailed(String),

    #[error("unit directory error: {0}")]
    Backend(String),
}

impl From<DirectoryError> for ShellError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unreachable(_) | DirectoryError::StartFailed(_) => {
                ShellError::ShellStartFailure(err.to_string())
            }
            DirectoryError::Backend(reason) => ShellError::Internal(reason),
        }
    }
}
