//! Cache Module
//!
//! Tenant-partitioned storage contract and its in-memory reference backend.

mod memory;
mod storage;


// Re-export public types
pub use memory::InMemoryStorage;
pub use storage::{Storage, StorageError, StorageResult};
