//! In-memory unit directory
//!
//! Units are registered explicitly and every shell started on them is an
//! echo process: input comes straight back as output until the client sends
//! `exit`. Start attempts and resize notifications are recorded so callers can
//! assert on exactly what reached each unit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;
use unitshell_domain::{
    App, DirectoryError, ShellInvocation, ShellOptions, ShellStream, ShellStreamBackend, TermSize,
    Unit, UnitDirectory,
};

use crate::invocations::InvocationLog;

const STREAM_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct MemoryState {
    units: Vec<Unit>,
    failing: HashSet<String>,
    resizes: HashMap<String, Vec<TermSize>>,
}

/// Unit directory held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryUnitDirectory {
    state: Arc<Mutex<MemoryState>>,
    invocations: InvocationLog,
}

impl MemoryUnitDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` started units to `app`, ids continuing as `<app>-<n>`
    pub fn add_units(&self, app: &App, count: usize, process_name: &str) -> Vec<Unit> {
        let mut state = self.state.lock();
        let existing = state.units.iter().filter(|u| u.belongs_to(app)).count();
        let added: Vec<Unit> = (existing..existing + count)
            .map(|n| Unit::new(format!("{}-{n}", app.name), app.name.clone(), process_name))
            .collect();
        state.units.extend(added.iter().cloned());
        added
    }

    /// Add a single unit as-is
    pub fn add_unit(&self, unit: Unit) {
        self.state.lock().units.push(unit);
    }

    /// Make every future shell start on `unit_id` fail
    pub fn fail_start(&self, unit_id: &str) {
        self.state.lock().failing.insert(unit_id.to_string());
    }

    /// Resize notifications delivered to shells on `unit_id`
    pub fn recorded_resizes(&self, unit_id: &str) -> Vec<TermSize> {
        self.state
            .lock()
            .resizes
            .get(unit_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Shell start attempts across every unit
    pub fn total_invocations(&self) -> usize {
        self.invocations.total()
    }

    fn spawn_echo(&self, unit_id: String, backend: ShellStreamBackend) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let ShellStreamBackend {
                mut input,
                output,
                mut resize,
            } = backend;

            loop {
                tokio::select! {
                    biased;

                    Some(size) = resize.recv() => {
                        state.lock().resizes.entry(unit_id.clone()).or_default().push(size);
                    }
                    chunk = input.recv() => {
                        let Some(chunk) = chunk else { break };
                        if is_exit(&chunk) || output.send(chunk).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(unit = %unit_id, "Echo shell finished");
        });
    }
}

fn is_exit(chunk: &Bytes) -> bool {
    std::str::from_utf8(chunk).is_ok_and(|text| text.trim() == "exit")
}

#[async_trait]
impl UnitDirectory for MemoryUnitDirectory {
    async fn list_units(&self, app: &App) -> Result<Vec<Unit>, DirectoryError> {
        Ok(self
            .state
            .lock()
            .units
            .iter()
            .filter(|u| u.belongs_to(app))
            .cloned()
            .collect())
    }

    async fn start_shell(&self, options: ShellOptions) -> Result<ShellStream, DirectoryError> {
        let unit_id = options.unit_id().to_string();
        self.invocations.record(&unit_id, options.invocation());

        {
            let state = self.state.lock();
            if !state.units.iter().any(|u| u.id == unit_id) {
                return Err(DirectoryError::Unreachable(unit_id));
            }
            if state.failing.contains(&unit_id) {
                return Err(DirectoryError::StartFailed(format!(
                    "process could not start on unit {unit_id}"
                )));
            }
        }

        let (stream, backend) = ShellStream::channel(STREAM_CAPACITY);
        self.spawn_echo(unit_id, backend);
        Ok(stream)
    }

    fn recorded_shell_invocations(&self, unit_id: &str) -> Vec<ShellInvocation> {
        self.invocations.for_unit(unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitshell_domain::{ResolvedTarget, ShellRequest};

    fn options(app: &App, unit: Unit, pinned: bool) -> ShellOptions {
        let request =
            ShellRequest::parse(app.name.clone(), Some("140"), Some("38"), Some("xterm"), None)
                .unwrap();
        ShellOptions::new(
            ResolvedTarget {
                app: app.clone(),
                unit,
                pinned,
            },
            &request,
        )
    }

    #[tokio::test]
    async fn test_add_units_continues_numbering() {
        let directory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");

        directory.add_units(&app, 2, "web");
        let more = directory.add_units(&app, 1, "worker");

        assert_eq!(more[0].id, "someapp-2");
        let ids: Vec<String> = directory
            .list_units(&app)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["someapp-0", "someapp-1", "someapp-2"]);
    }

    #[tokio::test]
    async fn test_echo_shell_and_resize() {
        let directory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");
        let unit = directory.add_units(&app, 1, "web").remove(0);

        let mut stream = directory
            .start_shell(options(&app, unit.clone(), true))
            .await
            .unwrap();

        stream.input.send(Bytes::from_static(b"echo test")).await.unwrap();
        assert_eq!(stream.output.recv().await.unwrap(), Bytes::from_static(b"echo test"));

        stream.resize.send(TermSize { width: 100, height: 40 }).await.unwrap();
        stream.input.send(Bytes::from_static(b"exit\n")).await.unwrap();
        assert!(stream.output.recv().await.is_none());

        assert_eq!(
            directory.recorded_resizes(&unit.id),
            vec![TermSize { width: 100, height: 40 }]
        );
        let recorded = directory.recorded_shell_invocations(&unit.id);
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].unit, unit.id);
        assert_eq!((recorded[0].width, recorded[0].height), (140, 38));
    }

    #[tokio::test]
    async fn test_failed_starts_are_recorded() {
        let directory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");
        let unit = directory.add_units(&app, 1, "web").remove(0);
        directory.fail_start(&unit.id);

        let err = directory
            .start_shell(options(&app, unit.clone(), false))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::StartFailed(_)));
        assert_eq!(directory.recorded_shell_invocations(&unit.id).len(), 1);
        assert_eq!(directory.recorded_shell_invocations(&unit.id)[0].unit, "");
    }

    #[tokio::test]
    async fn test_unknown_unit_is_unreachable() {
        let directory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");

        let err = directory
            .start_shell(options(&app, Unit::new("ghost", "someapp", "web"), true))
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::Unreachable("ghost".to_string()));
    }
}
