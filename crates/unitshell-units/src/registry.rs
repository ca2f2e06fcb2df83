//! In-memory application registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use unitshell_domain::{App, AppRegistry, DirectoryError};

/// Application registry backed by a map, seeded from configuration or tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppRegistry {
    apps: Arc<RwLock<HashMap<String, App>>>,
}

impl InMemoryAppRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an application
    pub fn register(&self, app: App) {
        self.apps.write().insert(app.name.clone(), app);
    }

    /// Remove an application, returning it if present
    pub fn remove(&self, name: &str) -> Option<App> {
        self.apps.write().remove(name)
    }

    /// Number of registered applications
    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }
}

#[async_trait]
impl AppRegistry for InMemoryAppRegistry {
    async fn find_app(&self, name: &str) -> Result<Option<App>, DirectoryError> {
        Ok(self.apps.read().get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_find() {
        let registry = InMemoryAppRegistry::new();
        assert!(registry.is_empty());

        registry.register(App::new("someapp", "admins"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find_app("someapp").await.unwrap(),
            Some(App::new("someapp", "admins"))
        );
        assert_eq!(registry.find_app("otherapp").await.unwrap(), None);

        assert!(registry.remove("someapp").is_some());
        assert_eq!(registry.find_app("someapp").await.unwrap(), None);
    }
}
