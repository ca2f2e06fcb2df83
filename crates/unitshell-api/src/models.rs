//! Request and response models

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the server started
    pub uptime: u64,
}

/// Query parameters of a shell upgrade request.
///
/// Values stay raw here; they are validated once the socket is open so the
/// client gets the failure in-band.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShellQuery {
    /// Terminal width in columns
    pub width: Option<String>,
    /// Terminal height in rows
    pub height: Option<String>,
    /// Terminal type, e.g. `xterm`
    pub term: Option<String>,
    /// Unit to bind to; any unit of the app when absent or empty
    pub unit: Option<String>,
}
