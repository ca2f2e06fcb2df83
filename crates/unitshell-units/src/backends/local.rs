//! Local PTY unit directory
//!
//! Each configured unit is a local pseudo-instance: starting a shell spawns
//! the configured command inside a fresh PTY on this host. Useful for
//! development and single-host deployments.

use std::io::{Read, Write};
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use unitshell_domain::{
    App, DirectoryError, ShellInvocation, ShellOptions, ShellStream, ShellStreamBackend, TermSize,
    Unit, UnitDirectory,
};

use crate::invocations::InvocationLog;

const STREAM_CAPACITY: usize = 256;
const READ_BUFFER_SIZE: usize = 8192;

/// Unit directory that runs shells as local PTY processes
#[derive(Debug, Clone)]
pub struct LocalUnitDirectory {
    shell: String,
    units: Vec<Unit>,
    invocations: InvocationLog,
}

impl LocalUnitDirectory {
    /// Create a directory spawning `shell` for every session
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            units: Vec::new(),
            invocations: InvocationLog::new(),
        }
    }

    /// Register units for an application, keeping the given order
    pub fn with_units<I, S>(mut self, app_name: &str, unit_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units.extend(
            unit_ids
                .into_iter()
                .map(|id| Unit::new(id, app_name, "local")),
        );
        self
    }

    /// Command spawned for each shell
    pub fn shell(&self) -> &str {
        &self.shell
    }

    fn spawn_pty(&self, options: &ShellOptions) -> Result<ShellStream, DirectoryError> {
        let pair = native_pty_system()
            .openpty(pty_size(options.size))
            .map_err(|e| DirectoryError::StartFailed(format!("failed to open pty: {e}")))?;

        let mut command = CommandBuilder::new(&self.shell);
        command.env("TERM", &options.term);
        command.env("UNITSHELL_APP", &options.target.app.name);
        command.env("UNITSHELL_UNIT", options.unit_id());

        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|e| DirectoryError::StartFailed(format!("failed to spawn {}: {e}", self.shell)))?;
        drop(pair.slave);

        let io = pair
            .master
            .try_clone_reader()
            .and_then(|reader| Ok((reader, pair.master.take_writer()?)));
        let (reader, writer) = match io {
            Ok(io) => io,
            Err(e) => {
                reap(child);
                return Err(DirectoryError::StartFailed(e.to_string()));
            }
        };

        let (stream, backend) = ShellStream::channel(STREAM_CAPACITY);
        let ShellStreamBackend {
            input,
            output,
            resize,
        } = backend;

        // The writer thread takes ownership of the child only once both
        // threads exist; until then a failure reaps it here.
        let (child_tx, child_rx) = oneshot::channel();
        let unit_id = options.unit_id().to_string();
        let spawned = thread::Builder::new()
            .name(format!("pty-reader-{unit_id}"))
            .spawn(move || pump_output(reader, output))
            .and_then(|_| {
                thread::Builder::new()
                    .name(format!("pty-writer-{unit_id}"))
                    .spawn(move || pump_input(writer, input, child_rx))
            });
        if let Err(e) = spawned {
            reap(child);
            return Err(DirectoryError::StartFailed(e.to_string()));
        }
        if let Err(child) = child_tx.send(child) {
            reap(child);
            return Err(DirectoryError::StartFailed("pty writer exited early".to_string()));
        }
        tokio::spawn(apply_resizes(pair.master, resize));

        Ok(stream)
    }
}

fn pty_size(size: TermSize) -> PtySize {
    PtySize {
        rows: size.height,
        cols: size.width,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn pump_output(mut reader: Box<dyn Read + Send>, output: mpsc::Sender<Bytes>) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if output.blocking_send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "PTY read ended");
                break;
            }
        }
    }
}

fn pump_input(
    mut writer: Box<dyn Write + Send>,
    mut input: mpsc::Receiver<Bytes>,
    child: oneshot::Receiver<Box<dyn Child + Send + Sync>>,
) {
    let Ok(child) = child.blocking_recv() else {
        return;
    };
    while let Some(chunk) = input.blocking_recv() {
        if let Err(e) = writer.write_all(&chunk).and_then(|()| writer.flush()) {
            debug!(error = %e, "PTY write failed");
            break;
        }
    }

    // Input closes when the session is gone; the process must not outlive it.
    reap(child);
}

fn reap(mut child: Box<dyn Child + Send + Sync>) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Shell process already gone");
    }
    match child.wait() {
        Ok(status) => debug!(?status, "Shell process reaped"),
        Err(e) => warn!(error = %e, "Failed to reap shell process"),
    }
}

async fn apply_resizes(master: Box<dyn MasterPty + Send>, mut resize: mpsc::Receiver<TermSize>) {
    while let Some(size) = resize.recv().await {
        if let Err(e) = master.resize(pty_size(size)) {
            warn!(error = %e, %size, "Failed to resize PTY");
        }
    }
}

#[async_trait]
impl UnitDirectory for LocalUnitDirectory {
    async fn list_units(&self, app: &App) -> Result<Vec<Unit>, DirectoryError> {
        Ok(self
            .units
            .iter()
            .filter(|u| u.belongs_to(app))
            .cloned()
            .collect())
    }

    async fn start_shell(&self, options: ShellOptions) -> Result<ShellStream, DirectoryError> {
        let unit_id = options.unit_id().to_string();
        self.invocations.record(&unit_id, options.invocation());

        if !self.units.iter().any(|u| u.id == unit_id) {
            return Err(DirectoryError::Unreachable(unit_id));
        }

        let stream = self.spawn_pty(&options)?;
        info!(
            unit = %unit_id,
            shell = %self.shell,
            size = %options.size,
            term = %options.term,
            "Local shell started"
        );
        Ok(stream)
    }

    fn recorded_shell_invocations(&self, unit_id: &str) -> Vec<ShellInvocation> {
        self.invocations.for_unit(unit_id)
    }
}
