//! Credential Extraction
//!
//! Finds the bearer credential on a request: an `Authorization: Bearer`
//! header first, then the token cookie.

use axum::http::{header, HeaderMap};

/// Cookie name used by the gateway to carry the authentication token.
pub const DEFAULT_TOKEN_COOKIE: &str = "apimlAuthenticationToken";

/// Returns the bearer credential carried by `headers`, if any.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, token)| *name == cookie_name && !token.is_empty())
        .map(|(_, token)| token.to_string())
}
