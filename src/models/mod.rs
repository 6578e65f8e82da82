//! Request and Response models for the cache service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod key_value;
pub mod responses;

// Re-export commonly used types
pub use key_value::{validate_payload, InvalidPayload, KeyValue, KeyValuePayload};
pub use responses::HealthResponse;
