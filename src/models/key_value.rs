//! Key/Value models
//!
//! Defines the wire payload for cache writes and the validated value object
//! handed to storage.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Key Value ==
/// A validated cache entry.
///
/// Only produced by [`KeyValuePayload::validate`], so `key` is always a
/// non-empty alphanumeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The cache key, unique within a service partition
    pub key: String,
    /// The stored value
    pub value: String,
}

impl KeyValue {
    /// Creates a new KeyValue without validation.
    ///
    /// Intended for storage backends and tests; request data goes through
    /// [`validate_payload`] instead.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// == Key Value Payload ==
/// Request body for create and update (POST/PUT /cache).
///
/// Both fields are optional on the wire so that missing fields can be
/// reported with a precise reason instead of a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeyValuePayload {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl fmt::Display for KeyValuePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key.as_deref().unwrap_or("null");
        let value = self.value.as_deref().unwrap_or("null");
        write!(f, "KeyValue(key={}, value={})", key, value)
    }
}

// == Validation ==
pub const REASON_NO_PAYLOAD: &str = "No KeyValue provided in the payload";
pub const REASON_NO_KEY: &str = "No key provided in the payload";
pub const REASON_NO_VALUE: &str = "No value provided in the payload";
pub const REASON_NOT_ALPHANUMERIC: &str = "Key is not alphanumeric";

/// Reason a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPayload {
    pub reason: String,
}

impl InvalidPayload {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Validates an optional payload, first failing rule wins:
/// absent payload, absent key, absent value, non-alphanumeric key.
pub fn validate_payload(
    payload: Option<&KeyValuePayload>,
) -> Result<KeyValue, InvalidPayload> {
    let payload = payload.ok_or_else(|| InvalidPayload::new(REASON_NO_PAYLOAD))?;
    payload.validate()
}

impl KeyValuePayload {
    /// Validates this payload and converts it into a [`KeyValue`].
    pub fn validate(&self) -> Result<KeyValue, InvalidPayload> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| InvalidPayload::new(REASON_NO_KEY))?;
        let value = self
            .value
            .as_ref()
            .ok_or_else(|| InvalidPayload::new(REASON_NO_VALUE))?;

        if !is_alphanumeric(key) {
            return Err(InvalidPayload::new(REASON_NOT_ALPHANUMERIC));
        }

        Ok(KeyValue::new(key.clone(), value.clone()))
    }
}

/// Returns true for non-empty strings made only of Unicode letters and digits.
pub fn is_alphanumeric(key: &str) -> bool {
    !key.is_empty() && key.chars().all(char::is_alphanumeric)
}
