//! Messages Module
//!
//! Renders message codes plus positional arguments into the structured
//! bodies returned on every error response.

mod catalog;

pub use catalog::{CatalogMessageService, MessageError};

use serde::{Deserialize, Serialize};

// == Message Codes ==
pub mod codes {
    pub const TOKEN_NOT_PROVIDED: &str = "security.query.tokenNotProvided";
    pub const INVALID_TOKEN: &str = "security.query.invalidToken";
    pub const EXPIRED_TOKEN: &str = "security.expiredToken";
    pub const GATEWAY_UNAVAILABLE: &str = "cache.gatewayUnavailable";
    pub const INTERNAL_REQUEST_ERROR: &str = "common.internalRequestError";
    pub const INVALID_MESSAGE_KEY: &str = "common.invalidMessageKey";
    pub const INVALID_PAYLOAD: &str = "cache.invalidPayload";
    pub const KEY_COLLISION: &str = "cache.keyCollision";
    pub const KEY_NOT_IN_CACHE: &str = "cache.keyNotInCache";
    pub const KEY_NOT_PROVIDED: &str = "cache.keyNotProvided";
}

/// Severity of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Error,
    Warning,
    Info,
}

/// A rendered message as it appears in a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Catalog code, e.g. `cache.keyNotInCache`
    pub code: String,
    /// Stable message number for support lookups
    pub number: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Human-readable text with arguments substituted
    pub text: String,
}

/// Turns a message code and its arguments into an [`ApiMessage`].
///
/// Implementations must never fail: unknown codes render a fallback message.
pub trait MessageService: Send + Sync {
    fn render(&self, code: &str, args: &[String]) -> ApiMessage;
}
