//! Gateway Identity Resolver
//!
//! Resolves credentials by asking the gateway's token query endpoint who the
//! token belongs to.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{extract_credential, is_expired, AuthError, Identity, IdentityResolver};

/// Path of the token query endpoint, relative to the gateway base URL.
pub const QUERY_PATH: &str = "/gateway/api/v1/auth/query";

/// Body returned by the query endpoint for a valid token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    expiration: Option<String>,
}

/// Identity resolver that delegates token validation to the gateway.
#[derive(Debug, Clone)]
pub struct GatewayIdentityResolver {
    client: reqwest::Client,
    query_url: String,
    cookie_name: String,
}

impl GatewayIdentityResolver {
    /// Creates a resolver for the gateway at `gateway_url`.
    ///
    /// `timeout` bounds each query; a timed out query is reported as the
    /// gateway being unavailable.
    pub fn new(
        gateway_url: &str,
        cookie_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            query_url: format!("{}{}", gateway_url.trim_end_matches('/'), QUERY_PATH),
            cookie_name: cookie_name.into(),
        })
    }

    /// Full URL of the query endpoint.
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    async fn identity_from(&self, response: reqwest::Response) -> Result<Identity, AuthError> {
        let body: QueryResponse = response.json().await.map_err(|err| {
            AuthError::UpstreamError(format!("Undecodable token query response: {}", err))
        })?;

        if body.user_id.is_empty() {
            return Err(AuthError::UpstreamError(
                "Token query response carried no userId".to_string(),
            ));
        }

        let expires_at = body.expiration.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("Ignoring unparseable token expiration: {}", raw);
            }
            parsed
        });

        if is_expired(expires_at) {
            return Err(AuthError::ExpiredCredential);
        }

        Ok(Identity {
            service_id: body.user_id,
            domain: body.domain,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityResolver for GatewayIdentityResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token =
            extract_credential(headers, &self.cookie_name).ok_or(AuthError::MissingCredential)?;

        let response = self
            .client
            .get(&self.query_url)
            .header(header::COOKIE, format!("{}={}", self.cookie_name, token))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        debug!("Token query returned {}", status);

        match status {
            StatusCode::OK => self.identity_from(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                if body.to_ascii_lowercase().contains("expired") {
                    Err(AuthError::ExpiredCredential)
                } else {
                    Err(AuthError::InvalidCredential)
                }
            }
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Err(AuthError::UpstreamUnavailable(format!(
                "Token query returned {}",
                status
            ))),
            other => Err(AuthError::UpstreamError(format!(
                "Token query returned {}",
                other
            ))),
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> AuthError {
    if err.is_connect() || err.is_timeout() {
        AuthError::UpstreamUnavailable(err.to_string())
    } else {
        AuthError::UpstreamError(err.to_string())
    }
}

/// Parses RFC 3339 timestamps as well as the `+0000` offset form.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_TOKEN_COOKIE;
    use axum::http::HeaderValue;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bearer(token: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).unwrap();
        map.insert(axum::http::header::AUTHORIZATION, value);
        map
    }

    fn resolver_for(server: &MockServer) -> GatewayIdentityResolver {
        GatewayIdentityResolver::new(&server.uri(), DEFAULT_TOKEN_COOKIE, Duration::from_secs(2))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let server = MockServer::start().await;
        let expiration = (Utc::now() + ChronoDuration::hours(1)).to_rfc3339();
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .and(header_matcher("cookie", "apimlAuthenticationToken=good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": "svc1",
                "domain": "security-domain",
                "creation": Utc::now().to_rfc3339(),
                "expiration": expiration,
            })))
            .mount(&server)
            .await;

        let identity = resolver_for(&server).resolve(&bearer("good")).await.unwrap();
        assert_eq!(identity.service_id, "svc1");
        assert_eq!(identity.domain.as_deref(), Some("security-domain"));
        assert!(identity.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_credential_skips_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&HeaderMap::new()).await;
        assert_eq!(result, Err(AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "messages": [{ "messageKey": "org.zowe.apiml.security.query.invalidToken" }]
            })))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("forged")).await;
        assert_eq!(result, Err(AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_expired_token_from_gateway_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "messages": [{ "messageKey": "org.zowe.apiml.security.expiredToken" }]
            })))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("old")).await;
        assert_eq!(result, Err(AuthError::ExpiredCredential));
    }

    #[tokio::test]
    async fn test_past_expiration_is_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": "svc1",
                "expiration": "2020-07-08T10:43:03.000+0000",
            })))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("old")).await;
        assert_eq!(result, Err(AuthError::ExpiredCredential));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("good")).await;
        assert!(matches!(result, Err(AuthError::UpstreamError(_))));
    }

    #[tokio::test]
    async fn test_forbidden_token_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("Access denied"))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("good")).await;
        assert_eq!(result, Err(AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_gateway_unavailable_statuses() {
        for status in [502, 503, 504] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(QUERY_PATH))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let result = resolver_for(&server).resolve(&bearer("good")).await;
            assert!(
                matches!(result, Err(AuthError::UpstreamUnavailable(_))),
                "status {} gave {:?}",
                status,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "userId": "svc1" }))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let resolver = GatewayIdentityResolver::new(
            &server.uri(),
            DEFAULT_TOKEN_COOKIE,
            Duration::from_millis(200),
        )
        .unwrap();

        let result = resolver.resolve(&bearer("good")).await;
        assert!(matches!(result, Err(AuthError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_user_id_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = resolver_for(&server).resolve(&bearer("good")).await;
        assert!(matches!(result, Err(AuthError::UpstreamError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let resolver = GatewayIdentityResolver::new(
            "http://127.0.0.1:1",
            DEFAULT_TOKEN_COOKIE,
            Duration::from_millis(500),
        )
        .unwrap();

        let result = resolver.resolve(&bearer("good")).await;
        assert!(matches!(result, Err(AuthError::UpstreamUnavailable(_))));
    }

    #[test]
    fn test_query_url_joins_base() {
        let resolver = GatewayIdentityResolver::new(
            "https://gateway:10010/",
            DEFAULT_TOKEN_COOKIE,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            resolver.query_url(),
            "https://gateway:10010/gateway/api/v1/auth/query"
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2020-07-08T10:43:03Z").is_some());
        assert!(parse_timestamp("2020-07-08T10:43:03.000+0000").is_some());
        assert!(parse_timestamp("2020-07-08T10:43:03.000").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
