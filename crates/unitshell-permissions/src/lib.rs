//! Authorization for UnitShell
//!
//! Validates bearer credentials, resolves the caller's identity and checks
//! that the identity holds the shell permission on the target application.

pub mod error;
pub mod gate;
pub mod identity;
pub mod permission;

pub use error::{AuthError, Result};
pub use gate::{AuthorizationGate, Authorized};
pub use identity::{
    bearer_token, ChainedIdentityProvider, Identity, IdentityProvider, JwtIdentityProvider,
    StaticIdentityProvider,
};
pub use permission::{Context, Permission, PermissionChecker, PermissionOutcome, Scheme};
