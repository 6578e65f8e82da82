//! In-Memory Storage Module
//!
//! Reference [`Storage`] backend keeping every partition in process memory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::cache::{Storage, StorageError, StorageResult};
use crate::models::KeyValue;

type Partition = HashMap<String, KeyValue>;

// == In-Memory Storage ==
/// Stores partitions in a map of independently locked hash maps.
///
/// The outer lock is only held long enough to find or create a partition.
/// Each read-modify-write then runs under that partition's mutex, so
/// operations on different tenants never contend.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    partitions: RwLock<HashMap<String, Arc<Mutex<Partition>>>>,
}

impl InMemoryStorage {
    // == Constructor ==
    /// Creates an empty storage with no partitions.
    pub fn new() -> Self {
        Self::default()
    }

    // == Partition Count ==
    /// Returns how many partitions have been created so far.
    pub fn partition_count(&self) -> usize {
        self.partitions.read().len()
    }

    /// Looks up an existing partition without creating it.
    fn partition(&self, service_id: &str) -> Option<Arc<Mutex<Partition>>> {
        self.partitions.read().get(service_id).cloned()
    }

    /// Returns the partition for `service_id`, creating it on first write.
    fn partition_or_create(&self, service_id: &str) -> Arc<Mutex<Partition>> {
        if let Some(partition) = self.partition(service_id) {
            return partition;
        }

        self.partitions
            .write()
            .entry(service_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create(&self, service_id: &str, kv: KeyValue) -> StorageResult<KeyValue> {
        let partition = self.partition_or_create(service_id);
        let mut entries = partition.lock();

        if entries.contains_key(&kv.key) {
            return Err(StorageError::collision(service_id, &kv.key));
        }
        entries.insert(kv.key.clone(), kv.clone());

        Ok(kv)
    }

    async fn read(&self, service_id: &str, key: &str) -> StorageResult<KeyValue> {
        let partition = self
            .partition(service_id)
            .ok_or_else(|| StorageError::not_found(service_id, key))?;
        let entries = partition.lock();

        entries
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(service_id, key))
    }

    async fn read_all(&self, service_id: &str) -> StorageResult<HashMap<String, KeyValue>> {
        let Some(partition) = self.partition(service_id) else {
            return Ok(HashMap::new());
        };
        let snapshot = partition.lock().clone();

        Ok(snapshot)
    }

    async fn update(&self, service_id: &str, kv: KeyValue) -> StorageResult<KeyValue> {
        let partition = self
            .partition(service_id)
            .ok_or_else(|| StorageError::not_found(service_id, &kv.key))?;
        let mut entries = partition.lock();

        let Some(existing) = entries.get_mut(&kv.key) else {
            return Err(StorageError::not_found(service_id, &kv.key));
        };
        *existing = kv.clone();

        Ok(kv)
    }

    async fn delete(&self, service_id: &str, key: &str) -> StorageResult<KeyValue> {
        let partition = self
            .partition(service_id)
            .ok_or_else(|| StorageError::not_found(service_id, key))?;
        let mut entries = partition.lock();

        entries
            .remove(key)
            .ok_or_else(|| StorageError::not_found(service_id, key))
    }
}
