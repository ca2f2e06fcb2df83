//! Unit directory backends

mod local;
mod memory;

pub use local::LocalUnitDirectory;
pub use memory::MemoryUnitDirectory;

use async_trait::async_trait;
use unitshell_domain::{
    App, DirectoryError, ShellInvocation, ShellOptions, ShellStream, Unit, UnitDirectory,
};

/// Backend chosen at startup
#[derive(Debug, Clone)]
pub enum UnitBackend {
    /// Shells spawned in local PTYs
    Local(LocalUnitDirectory),
    /// Echo shells held in memory
    Memory(MemoryUnitDirectory),
}

impl UnitBackend {
    /// Short backend name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            UnitBackend::Local(_) => "local",
            UnitBackend::Memory(_) => "memory",
        }
    }

    fn directory(&self) -> &dyn UnitDirectory {
        match self {
            UnitBackend::Local(directory) => directory,
            UnitBackend::Memory(directory) => directory,
        }
    }
}

impl From<LocalUnitDirectory> for UnitBackend {
    fn from(directory: LocalUnitDirectory) -> Self {
        UnitBackend::Local(directory)
    }
}

impl From<MemoryUnitDirectory> for UnitBackend {
    fn from(directory: MemoryUnitDirectory) -> Self {
        UnitBackend::Memory(directory)
    }
}

#[async_trait]
impl UnitDirectory for UnitBackend {
    async fn list_units(&self, app: &App) -> Result<Vec<Unit>, DirectoryError> {
        self.directory().list_units(app).await
    }

    async fn start_shell(&self, options: ShellOptions) -> Result<ShellStream, DirectoryError> {
        self.directory().start_shell(options).await
    }

    fn recorded_shell_invocations(&self, unit_id: &str) -> Vec<ShellInvocation> {
        self.directory().recorded_shell_invocations(unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delegates_to_selected_backend() {
        let memory = MemoryUnitDirectory::new();
        let app = App::new("someapp", "admins");
        memory.add_units(&app, 2, "web");

        let backend = UnitBackend::from(memory);
        assert_eq!(backend.kind(), "memory");
        assert_eq!(backend.list_units(&app).await.unwrap().len(), 2);

        let local = UnitBackend::from(LocalUnitDirectory::new("/bin/sh").with_units("someapp", ["a"]));
        assert_eq!(local.kind(), "local");
        assert_eq!(local.list_units(&app).await.unwrap()[0].id, "a");
    }
}
