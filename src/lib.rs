//! Tenant Cache - A multi-tenant key-value cache service
//!
//! Calling services authenticate with a bearer token; each resolved service
//! id owns an isolated partition of keys.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod messages;
pub mod models;

pub use api::{create_router, AppState};
pub use config::Config;
