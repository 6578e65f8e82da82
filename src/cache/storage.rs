//! Storage Contract
//!
//! Partitioned key-value storage. Every operation is scoped to a service
//! partition and is a single atomic step against one `(service_id, key)` cell.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::KeyValue;

// == Storage Error ==
/// Typed outcomes for storage operations that did not mutate anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Create targeted a key that already exists in the partition
    #[error("Key '{key}' already exists for service '{service_id}'")]
    Collision { service_id: String, key: String },

    /// Read, update or delete targeted a key that is not in the partition
    #[error("Key '{key}' not found for service '{service_id}'")]
    NotFound { service_id: String, key: String },

    /// The backend itself failed (remote store unreachable, I/O error)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn collision(service_id: &str, key: &str) -> Self {
        Self::Collision {
            service_id: service_id.to_string(),
            key: key.to_string(),
        }
    }

    pub fn not_found(service_id: &str, key: &str) -> Self {
        Self::NotFound {
            service_id: service_id.to_string(),
            key: key.to_string(),
        }
    }
}

/// Convenience Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Storage Trait ==
/// Tenant-partitioned key-value storage.
///
/// Implementations must make `create`, `update` and `delete` linearizable per
/// `(service_id, key)`: of two concurrent creates for the same key exactly one
/// succeeds and the other gets [`StorageError::Collision`]. Operations on
/// different partitions must not block each other.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts `kv` iff its key is not yet present in the partition.
    async fn create(&self, service_id: &str, kv: KeyValue) -> StorageResult<KeyValue>;

    /// Returns the entry stored under `key`.
    async fn read(&self, service_id: &str, key: &str) -> StorageResult<KeyValue>;

    /// Returns a snapshot of every entry in the partition.
    ///
    /// Unknown partitions yield an empty map, never an error.
    async fn read_all(&self, service_id: &str) -> StorageResult<HashMap<String, KeyValue>>;

    /// Replaces the entry for `kv.key` iff it is present.
    async fn update(&self, service_id: &str, kv: KeyValue) -> StorageResult<KeyValue>;

    /// Removes and returns the entry for `key` iff it is present.
    async fn delete(&self, service_id: &str, key: &str) -> StorageResult<KeyValue>;
}
