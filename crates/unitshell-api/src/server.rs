//! Server assembly

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use unitshell_config::{BackendKind, ServerConfig};
use unitshell_domain::{App, Unit, UnitDirectory};
use unitshell_permissions::{
    AuthorizationGate, ChainedIdentityProvider, Identity, IdentityProvider, JwtIdentityProvider,
    Permission, StaticIdentityProvider,
};
use unitshell_units::{InMemoryAppRegistry, LocalUnitDirectory, MemoryUnitDirectory, UnitBackend};

use crate::{error::ApiResult, routes::all_routes, state::AppState};

/// HTTP and WebSocket server
#[derive(Debug, Clone)]
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a server around prepared state
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build identity providers, registry and unit backend from configuration
    pub fn from_config(config: &ServerConfig) -> ApiResult<Self> {
        let registry = InMemoryAppRegistry::new();
        for app in &config.apps {
            registry.register(App::new(app.name.clone(), app.team_owner.clone()));
        }

        let backend = build_backend(config);
        info!(
            backend = backend.kind(),
            apps = registry.len(),
            "Unit directory ready"
        );

        let gate = AuthorizationGate::new(build_identities(config)?, Arc::new(registry));
        let directory: Arc<dyn UnitDirectory> = Arc::new(backend);
        Ok(Self::new(AppState::new(
            gate,
            directory,
            config.connect_timeout(),
        )))
    }

    /// Shared state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router with every route mounted
    pub fn router(&self) -> Router {
        all_routes(self.state.clone())
    }

    /// Serve on `listener` until the process is stopped
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serve on `listener` until `signal` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        info!(%addr, "UnitShell API listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
    }
}

fn build_backend(config: &ServerConfig) -> UnitBackend {
    match config.backend.kind {
        BackendKind::Memory => {
            let directory = MemoryUnitDirectory::new();
            for app in &config.apps {
                for unit in &app.units {
                    directory.add_unit(Unit::new(unit.clone(), app.name.clone(), "memory"));
                }
            }
            UnitBackend::from(directory)
        }
        BackendKind::Local => {
            let directory = config
                .apps
                .iter()
                .fold(LocalUnitDirectory::new(config.backend.shell.clone()), |dir, app| {
                    dir.with_units(&app.name, app.units.iter().cloned())
                });
            UnitBackend::from(directory)
        }
    }
}

fn build_identities(config: &ServerConfig) -> ApiResult<Arc<dyn IdentityProvider>> {
    let mut chain = ChainedIdentityProvider::new();

    if let Some(secret) = config.auth.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
        chain = chain.with(Arc::new(JwtIdentityProvider::new(secret)));
    }

    if !config.auth.tokens.is_empty() {
        let mut table = StaticIdentityProvider::new();
        for token in &config.auth.tokens {
            let permissions = token
                .permissions
                .iter()
                .map(|p| p.parse::<Permission>())
                .collect::<Result<Vec<_>, _>>()?;
            table = table.with_token(token.token.clone(), Identity::new(token.subject.clone(), permissions));
        }
        chain = chain.with(Arc::new(table));
    }

    Ok(Arc::new(chain))
}
