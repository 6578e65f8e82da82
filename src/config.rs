//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_TOKEN_COOKIE;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the gateway resolving credentials; static tokens are used when unset
    pub gateway_url: Option<String>,
    /// Timeout for a single gateway token query, in milliseconds
    pub gateway_timeout_ms: u64,
    /// Cookie carrying the credential when no bearer header is present
    pub token_cookie_name: String,
    /// `(token, service_id)` pairs for the static resolver
    pub static_tokens: Vec<(String, String)>,
    /// Message catalog replacing the built-in one
    pub messages_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `GATEWAY_URL` - Gateway base URL (default: unset)
    /// - `GATEWAY_TIMEOUT_MS` - Token query timeout (default: 5000)
    /// - `TOKEN_COOKIE_NAME` - Credential cookie (default: apimlAuthenticationToken)
    /// - `STATIC_TOKENS` - `token=serviceId` pairs, comma separated (default: none)
    /// - `MESSAGES_PATH` - JSON message catalog (default: built-in)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            gateway_url: non_empty_var("GATEWAY_URL"),
            gateway_timeout_ms: env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.gateway_timeout_ms),
            token_cookie_name: non_empty_var("TOKEN_COOKIE_NAME")
                .unwrap_or(defaults.token_cookie_name),
            static_tokens: non_empty_var("STATIC_TOKENS")
                .map(|raw| parse_static_tokens(&raw))
                .unwrap_or_default(),
            messages_path: non_empty_var("MESSAGES_PATH").map(PathBuf::from),
        }
    }

    /// Gateway query timeout as a Duration.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            gateway_url: None,
            gateway_timeout_ms: 5000,
            token_cookie_name: DEFAULT_TOKEN_COOKIE.to_string(),
            static_tokens: Vec::new(),
            messages_path: None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `token=serviceId,token2=serviceId2`, skipping malformed entries.
fn parse_static_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(token, service_id)| (token.trim(), service_id.trim()))
        .filter(|(token, service_id)| !token.is_empty() && !service_id.is_empty())
        .map(|(token, service_id)| (token.to_string(), service_id.to_string()))
        .collect()
}
