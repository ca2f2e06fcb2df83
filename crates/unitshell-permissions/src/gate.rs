//! Authorization gate for shell requests

use std::sync::Arc;

use tracing::{debug, warn};
use unitshell_domain::{App, AppRegistry};

use crate::{
    error::{AuthError, Result},
    identity::{bearer_token, Identity, IdentityProvider},
    permission::{Context, PermissionChecker, PermissionOutcome, Scheme},
};

/// Caller cleared to open a shell on `app`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    /// Who is calling
    pub identity: Identity,
    /// Application record the caller may shell into
    pub app: App,
}

/// Stateless gate run once per connection.
///
/// Checks happen in a fixed order: credential, application existence,
/// then permission. Nothing is cached between calls.
#[derive(Clone)]
pub struct AuthorizationGate {
    identities: Arc<dyn IdentityProvider>,
    apps: Arc<dyn AppRegistry>,
    required: Scheme,
}

impl AuthorizationGate {
    /// Create a gate requiring the shell scheme
    pub fn new(identities: Arc<dyn IdentityProvider>, apps: Arc<dyn AppRegistry>) -> Self {
        Self {
            identities,
            apps,
            required: Scheme::run_shell(),
        }
    }

    /// Override the scheme callers must hold
    pub fn with_required_scheme(mut self, scheme: Scheme) -> Self {
        self.required = scheme;
        self
    }

    /// Scheme callers must hold
    pub fn required_scheme(&self) -> &Scheme {
        &self.required
    }

    /// Authorize the raw `Authorization` header value against `app_name`
    pub async fn authorize(&self, authorization: Option<&str>, app_name: &str) -> Result<Authorized> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::NoCredential)?;

        let identity = self.identities.identify(token).await.inspect_err(|e| {
            debug!(error = %e, "Credential rejected");
        })?;

        let app = self
            .apps
            .find_app(app_name)
            .await
            .map_err(|e| AuthError::Registry(e.to_string()))?
            .ok_or_else(|| AuthError::AppNotFound(app_name.to_string()))?;

        let contexts = Context::for_app(&app);
        match PermissionChecker::check(&identity.permissions, &self.required, &contexts) {
            PermissionOutcome::Allowed => {
                debug!(subject = %identity.subject, app = %app.name, "Shell access granted");
                Ok(Authorized { identity, app })
            }
            PermissionOutcome::Denied { reason } => {
                warn!(subject = %identity.subject, app = %app.name, %reason, "Shell access denied");
                Err(AuthError::PermissionDenied {
                    subject: identity.subject,
                    scheme: self.required.to_string(),
                    app: app.name,
                })
            }
        }
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}
