//! Authentication Module
//!
//! Resolves the bearer credential on an inbound request into the identity of
//! the calling service. The service id becomes the caller's cache partition.

mod credential;
mod gateway;
mod static_tokens;

pub use credential::{extract_credential, DEFAULT_TOKEN_COOKIE};
pub use gateway::GatewayIdentityResolver;
pub use static_tokens::StaticIdentityResolver;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use thiserror::Error;

// == Identity ==
/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Partition owning every key this caller touches
    pub service_id: String,
    /// Security domain reported by the token service, if any
    pub domain: Option<String>,
    /// Token expiry reported by the token service, if any
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            domain: None,
            expires_at: None,
        }
    }
}

// == Auth Error ==
/// Every way resolving a credential can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential on the request
    #[error("No credential provided")]
    MissingCredential,

    /// Credential rejected as malformed or forged
    #[error("Credential is not valid")]
    InvalidCredential,

    /// Credential was valid but has expired
    #[error("Credential has expired")]
    ExpiredCredential,

    /// The identity service could not be reached
    #[error("Identity service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Any other identity service failure
    #[error("Identity service error: {0}")]
    UpstreamError(String),
}

// == Identity Resolver ==
/// Resolves request headers into an [`Identity`].
///
/// Implementations do not cache identities; every request is resolved anew.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Identity, AuthError>;
}

/// Returns true when `expires_at` lies in the past.
pub(crate) fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.is_some_and(|expiry| expiry <= Utc::now())
}
