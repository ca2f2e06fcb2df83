//! UnitShell domain
//!
//! Shared data types for interactive shell sessions into application units,
//! the failure taxonomy reported back to clients, and the ports through which
//! the core talks to the application registry and the unit directory.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{App, Unit, UnitStatus};
pub use errors::{DirectoryError, ShellError, ShellResult};
pub use ports::{AppRegistry, ShellStream, ShellStreamBackend, UnitDirectory};
pub use value_objects::{
    ResolvedTarget, ShellInvocation, ShellOptions, ShellRequest, TermSize,
};
