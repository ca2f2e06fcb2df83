//! Collaborator interfaces
//!
//! The core never owns applications or units; it asks these ports for them
//! on every request. Backends live in infrastructure crates.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{
    entities::{App, Unit},
    errors::DirectoryError,
    value_objects::{ShellInvocation, ShellOptions, TermSize},
};

/// Lookup of registered applications
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Find an application by name
    async fn find_app(&self, name: &str) -> Result<Option<App>, DirectoryError>;
}

/// Source of units and the means to start processes on them
#[async_trait]
pub trait UnitDirectory: Send + Sync {
    /// Current units of an application, in a stable backend-defined order
    async fn list_units(&self, app: &App) -> Result<Vec<Unit>, DirectoryError>;

    /// Start an interactive shell on the unit named by `options`
    async fn start_shell(&self, options: ShellOptions) -> Result<ShellStream, DirectoryError>;

    /// Every shell start attempt recorded for a unit, oldest first
    fn recorded_shell_invocations(&self, unit_id: &str) -> Vec<ShellInvocation>;
}

/// Bidirectional byte stream to a running shell process.
///
/// Dropping `input` tells the backend the client is gone and the process
/// must be torn down. `output` yields `None` once the process has exited.
#[derive(Debug)]
pub struct ShellStream {
    /// Bytes for the process's standard input
    pub input: mpsc::Sender<Bytes>,
    /// Bytes produced by the process, in order
    pub output: mpsc::Receiver<Bytes>,
    /// Terminal resize notifications
    pub resize: mpsc::Sender<TermSize>,
}

impl ShellStream {
    /// Create a stream plus the backend-side ends of its channels
    pub fn channel(capacity: usize) -> (Self, ShellStreamBackend) {
        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);
        let (resize_tx, resize_rx) = mpsc::channel(8);

        (
            Self {
                input: input_tx,
                output: output_rx,
                resize: resize_tx,
            },
            ShellStreamBackend {
                input: input_rx,
                output: output_tx,
                resize: resize_rx,
            },
        )
    }
}

/// Backend half of a [`ShellStream`]
#[derive(Debug)]
pub struct ShellStreamBackend {
    /// Client input destined for the process
    pub input: mpsc::Receiver<Bytes>,
    /// Process output destined for the client
    pub output: mpsc::Sender<Bytes>,
    /// Resize notifications from the client
    pub resize: mpsc::Receiver<TermSize>,
}
