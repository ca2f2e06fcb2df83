//! Per-directory record of shell start attempts

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use unitshell_domain::ShellInvocation;

/// Shell start attempts keyed by the unit they were sent to.
///
/// Owned by a single directory instance; clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<HashMap<String, Vec<ShellInvocation>>>>,
}

impl InvocationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt for `unit_id`
    pub fn record(&self, unit_id: &str, invocation: ShellInvocation) {
        self.entries
            .lock()
            .entry(unit_id.to_string())
            .or_default()
            .push(invocation);
    }

    /// Attempts recorded for `unit_id`, oldest first
    pub fn for_unit(&self, unit_id: &str) -> Vec<ShellInvocation> {
        self.entries
            .lock()
            .get(unit_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total attempts across all units
    pub fn total(&self) -> usize {
        self.entries.lock().values().map(Vec::len).sum()
    }
}
