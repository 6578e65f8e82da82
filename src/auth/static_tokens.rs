//! Static Token Resolver
//!
//! Resolves credentials against a fixed in-memory token table. Used for
//! local development and tests when no gateway is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;

use super::{extract_credential, is_expired, AuthError, Identity, IdentityResolver};

/// Identity resolver backed by a token -> identity table.
#[derive(Debug, Clone)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
    cookie_name: String,
}

impl StaticIdentityResolver {
    /// Creates a resolver with an empty table; every credential is invalid.
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            tokens: HashMap::new(),
            cookie_name: cookie_name.into(),
        }
    }

    /// Builds a resolver from `(token, service_id)` pairs.
    pub fn from_pairs<I>(cookie_name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(cookie_name), |resolver, (token, service_id)| {
                resolver.with_token(token, Identity::new(service_id))
            })
    }

    /// Registers `token` as resolving to `identity`.
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Returns the number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token =
            extract_credential(headers, &self.cookie_name).ok_or(AuthError::MissingCredential)?;
        let identity = self.tokens.get(&token).ok_or(AuthError::InvalidCredential)?;

        if is_expired(identity.expires_at) {
            return Err(AuthError::ExpiredCredential);
        }

        Ok(identity.clone())
    }
}
