//! Application state for the API server

use std::{sync::Arc, time::Duration, time::Instant};

use unitshell_domain::UnitDirectory;
use unitshell_permissions::AuthorizationGate;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Gate every shell connection passes before anything else happens
    pub gate: Arc<AuthorizationGate>,
    /// Where units are listed and shells started
    pub directory: Arc<dyn UnitDirectory>,
    /// Bound on authorization, resolution and shell start
    pub connect_timeout: Duration,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        gate: AuthorizationGate,
        directory: Arc<dyn UnitDirectory>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            gate: Arc::new(gate),
            directory,
            connect_timeout,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}
