//! Per-connection session lifecycle

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;
use unitshell_domain::{ShellError, ShellResult};
use uuid::Uuid;

/// Where a connection is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Authorizing, resolving and starting the shell
    Connecting,
    /// Bytes flowing both ways
    Bridging,
    /// Torn down, terminal
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Bridging => write!(f, "bridging"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// One client connection to one unit.
///
/// States only move forward: `Connecting` may go to `Bridging` or straight
/// to `Closed`, `Bridging` only to `Closed`.
#[derive(Debug, Clone)]
pub struct ShellSession {
    id: Uuid,
    app: String,
    unit: Option<String>,
    state: SessionState,
    started_at: DateTime<Utc>,
}

impl ShellSession {
    /// Start tracking a new connection
    pub fn new(app: impl Into<String>, unit: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            app: app.into(),
            unit,
            state: SessionState::Connecting,
            started_at: Utc::now(),
        }
    }

    /// Session id used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requested application
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Requested unit, if any
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Milliseconds since the connection was accepted
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Move to `next`, rejecting anything but a forward step
    pub fn transition(&mut self, next: SessionState) -> ShellResult<()> {
        if next <= self.state {
            return Err(ShellError::Internal(format!(
                "session {} cannot move from {} to {}",
                self.id, self.state, next
            )));
        }
        debug!(session = %self.id, from = %self.state, to = %next, "Session state changed");
        self.state = next;
        Ok(())
    }
}
