//! API Handlers
//!
//! HTTP request handlers for the cache endpoints. Each handler authenticates
//! through [`Caller`], validates its input, delegates to [`Storage`] and maps
//! the outcome to a status and message code.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{StatusCode, Uri},
    Json,
};
use tracing::{debug, info, warn};

use crate::auth::{GatewayIdentityResolver, IdentityResolver, StaticIdentityResolver};
use crate::cache::{InMemoryStorage, Storage, StorageError};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::messages::{codes, CatalogMessageService, MessageService};
use crate::models::{validate_payload, HealthResponse, InvalidPayload, KeyValue, KeyValuePayload};

use super::Caller;

/// Application state shared across all handlers.
///
/// Holds the three collaborators each request goes through. Storage owns its
/// own locking, so the state itself is immutable.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub identity: Arc<dyn IdentityResolver>,
    pub messages: Arc<dyn MessageService>,
}

impl AppState {
    /// Creates a new AppState from explicit collaborators.
    pub fn new(
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityResolver>,
        messages: Arc<dyn MessageService>,
    ) -> Self {
        Self {
            storage,
            identity,
            messages,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses the gateway resolver when a gateway URL is configured and the
    /// static token table otherwise. Storage is always in memory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let messages = match &config.messages_path {
            Some(path) => CatalogMessageService::from_path(path)?,
            None => CatalogMessageService::builtin()?,
        };

        let identity: Arc<dyn IdentityResolver> = match &config.gateway_url {
            Some(url) => Arc::new(GatewayIdentityResolver::new(
                url,
                config.token_cookie_name.clone(),
                config.gateway_timeout(),
            )?),
            None => {
                let resolver = StaticIdentityResolver::from_pairs(
                    config.token_cookie_name.clone(),
                    config.static_tokens.clone(),
                );
                if resolver.is_empty() {
                    warn!(
                        "No GATEWAY_URL or STATIC_TOKENS configured; all requests will be rejected"
                    );
                }
                Arc::new(resolver)
            }
        };

        Ok(Self::new(
            Arc::new(InMemoryStorage::new()),
            identity,
            Arc::new(messages),
        ))
    }

    fn error(&self, status: StatusCode, code: &str, args: &[String]) -> ApiError {
        ApiError::render(self.messages.as_ref(), status, code, args)
    }

    /// Maps a storage rejection to its response.
    fn storage_failure(&self, caller: &Caller, err: StorageError) -> ApiError {
        match err {
            StorageError::Collision { key, .. } => {
                debug!(service_id = caller.service_id(), key = %key, "Key collision");
                self.error(StatusCode::CONFLICT, codes::KEY_COLLISION, &[key])
            }
            StorageError::NotFound { key, service_id } => {
                debug!(service_id = %service_id, key = %key, "Key not in cache");
                self.error(
                    StatusCode::NOT_FOUND,
                    codes::KEY_NOT_IN_CACHE,
                    &[key, service_id],
                )
            }
            StorageError::Backend(detail) => {
                warn!("Storage failure for {}: {}", caller.url, detail);
                self.error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_REQUEST_ERROR,
                    &[caller.url.clone(), detail],
                )
            }
        }
    }

    /// Decodes and validates a write body into a [`KeyValue`].
    fn key_value_from(&self, body: &Bytes) -> Result<KeyValue> {
        let invalid = |payload: String, rejection: InvalidPayload| {
            debug!("Rejected payload {}: {}", payload, rejection.reason);
            self.error(
                StatusCode::BAD_REQUEST,
                codes::INVALID_PAYLOAD,
                &[payload, rejection.reason],
            )
        };

        let payload = decode_payload(body).map_err(|rejection| {
            invalid(String::from_utf8_lossy(body).into_owned(), rejection)
        })?;

        validate_payload(payload.as_ref()).map_err(|rejection| {
            let shown = payload
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "null".to_string());
            invalid(shown, rejection)
        })
    }
}

/// Empty bodies and JSON `null` are an absent payload.
fn decode_payload(body: &Bytes) -> std::result::Result<Option<KeyValuePayload>, InvalidPayload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body).map_err(|err| InvalidPayload {
        reason: format!("Malformed JSON payload: {}", err),
    })
}

/// Returns the key named by the request path, or None when the segment is
/// missing or blank.
///
/// A segment that cannot be decoded is still a key: its raw text is looked
/// up as-is, so it reports as not in the cache rather than not provided.
fn requested_key(key: std::result::Result<Path<String>, PathRejection>, uri: &Uri) -> Option<String> {
    let key = match key {
        Ok(Path(key)) => key,
        Err(rejection) => {
            debug!("Using raw key segment of {}: {}", uri.path(), rejection);
            uri.path()
                .rsplit_once('/')
                .map(|(_, raw)| raw.to_string())
                .unwrap_or_default()
        }
    };

    Some(key).filter(|key| !key.is_empty())
}

/// Handler for POST /cache
///
/// Creates a new entry in the caller's partition.
pub async fn create_key(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<StatusCode> {
    let kv = state.key_value_from(&body)?;
    let key = kv.key.clone();

    state
        .storage
        .create(caller.service_id(), kv)
        .await
        .map_err(|err| state.storage_failure(&caller, err))?;

    info!(service_id = caller.service_id(), key = %key, "Created key");
    Ok(StatusCode::CREATED)
}

/// Handler for GET /cache/:key
///
/// Retrieves one entry from the caller's partition.
pub async fn get_value(
    State(state): State<AppState>,
    caller: Caller,
    key: std::result::Result<Path<String>, PathRejection>,
    uri: Uri,
) -> Result<Json<KeyValue>> {
    let Some(key) = requested_key(key, &uri) else {
        return Err(state.error(
            StatusCode::BAD_REQUEST,
            codes::KEY_NOT_PROVIDED,
            &[caller.service_id().to_string()],
        ));
    };

    let kv = state
        .storage
        .read(caller.service_id(), &key)
        .await
        .map_err(|err| state.storage_failure(&caller, err))?;

    Ok(Json(kv))
}

/// Handler for GET /cache
///
/// Returns every entry in the caller's partition, possibly none.
pub async fn get_all_values(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<HashMap<String, KeyValue>>> {
    let entries = state
        .storage
        .read_all(caller.service_id())
        .await
        .map_err(|err| state.storage_failure(&caller, err))?;

    debug!(service_id = caller.service_id(), count = entries.len(), "Read all keys");
    Ok(Json(entries))
}

/// Handler for PUT /cache
///
/// Replaces an existing entry in the caller's partition.
pub async fn update_key(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<StatusCode> {
    let kv = state.key_value_from(&body)?;
    let key = kv.key.clone();

    state
        .storage
        .update(caller.service_id(), kv)
        .await
        .map_err(|err| state.storage_failure(&caller, err))?;

    info!(service_id = caller.service_id(), key = %key, "Updated key");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /cache/:key
///
/// Removes an entry from the caller's partition.
pub async fn delete_key(
    State(state): State<AppState>,
    caller: Caller,
    key: std::result::Result<Path<String>, PathRejection>,
    uri: Uri,
) -> Result<StatusCode> {
    let Some(key) = requested_key(key, &uri) else {
        return Err(state.error(StatusCode::BAD_REQUEST, codes::KEY_NOT_PROVIDED, &[]));
    };

    state
        .storage
        .delete(caller.service_id(), &key)
        .await
        .map_err(|err| state.storage_failure(&caller, err))?;

    info!(service_id = caller.service_id(), key = %key, "Deleted key");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /health
///
/// Returns health status of the service. Not authenticated.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
