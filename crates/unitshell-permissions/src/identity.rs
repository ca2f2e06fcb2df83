//! Caller identities and the providers that resolve them from credentials

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, Result},
    permission::Permission,
};

/// Authenticated caller and everything it has been granted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User or service name
    pub subject: String,
    /// Granted permissions
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Identity {
    /// Create a new identity
    pub fn new(subject: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            subject: subject.into(),
            permissions,
        }
    }
}

/// Extract the token from an `Authorization: bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves a bearer token to an identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate `token` and return who it belongs to
    async fn identify(&self, token: &str) -> Result<Identity>;
}

/// Fixed token table, typically loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Number of registered tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if no tokens are registered
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn identify(&self, token: &str) -> Result<Identity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidCredential("unknown token".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    #[serde(default)]
    permissions: Vec<Permission>,
}

/// HS256 JSON web tokens carrying the subject and its permissions
pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Create a provider signing and verifying with `secret`
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `identity` valid until `expires_at`
    pub fn issue(&self, identity: &Identity, expires_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: identity.subject.clone(),
            exp: expires_at.timestamp(),
            permissions: identity.permissions.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }
}

impl std::fmt::Debug for JwtIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn identify(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        Ok(Identity::new(data.claims.sub, data.claims.permissions))
    }
}

/// Tries each provider in turn; the first that recognises the token wins
#[derive(Clone, Default)]
pub struct ChainedIdentityProvider {
    providers: Vec<Arc<dyn IdentityProvider>>,
}

impl ChainedIdentityProvider {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider
    pub fn with(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of providers in the chain
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the chain has no providers
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for ChainedIdentityProvider {
    async fn identify(&self, token: &str) -> Result<Identity> {
        let mut last_error = AuthError::InvalidCredential("no identity provider configured".to_string());
        for provider in &self.providers {
            match provider.identify(token).await {
                Ok(identity) => return Ok(identity),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}
