//! Caller Extraction
//!
//! Resolves the identity of the calling service before any path or body
//! extraction runs, so authentication always fails first.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use tracing::warn;

use crate::auth::{AuthError, Identity};
use crate::error::ApiError;
use crate::messages::{codes, MessageService};

use super::AppState;

/// The authenticated caller of a cache request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    /// Full request URL (scheme, host, path and query), quoted in error messages
    pub url: String,
}

impl Caller {
    pub fn service_id(&self) -> &str {
        &self.identity.service_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let url = request_url(parts);

        match state.identity.resolve(&parts.headers).await {
            Ok(identity) => Ok(Caller { identity, url }),
            Err(err) => {
                warn!("Authentication failed for {} {}: {}", parts.method, url, err);
                Err(auth_failure(state.messages.as_ref(), &err, &url))
            }
        }
    }
}

/// Rebuilds the full request URL from the `Host` header and the URI.
///
/// The scheme comes from `X-Forwarded-Proto` when a proxy set it. Without a
/// `Host` header only the path and query are available.
pub fn request_url(parts: &Parts) -> String {
    if parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => {
            let scheme = parts
                .headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http");
            format!("{}://{}{}", scheme, host, path)
        }
        None => path.to_string(),
    }
}

/// Maps an identity resolution failure to its response.
///
/// An unreachable identity service is reported as 404 rather than 503 to
/// stay compatible with existing clients.
pub fn auth_failure(messages: &dyn MessageService, err: &AuthError, url: &str) -> ApiError {
    let url = url.to_string();
    let (status, code, args) = match err {
        AuthError::MissingCredential => {
            (StatusCode::BAD_REQUEST, codes::TOKEN_NOT_PROVIDED, vec![url])
        }
        AuthError::InvalidCredential => (StatusCode::UNAUTHORIZED, codes::INVALID_TOKEN, vec![url]),
        AuthError::ExpiredCredential => (StatusCode::UNAUTHORIZED, codes::EXPIRED_TOKEN, vec![url]),
        AuthError::UpstreamUnavailable(detail) => (
            StatusCode::NOT_FOUND,
            codes::GATEWAY_UNAVAILABLE,
            vec![url, detail.clone()],
        ),
        AuthError::UpstreamError(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_REQUEST_ERROR,
            vec![url, detail.clone()],
        ),
    };

    ApiError::render(messages, status, code, &args)
}
