//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `POST /cache` - Create a key in the caller's partition
//! - `GET /cache` - Read every key in the caller's partition
//! - `GET /cache/:key` - Read one key
//! - `PUT /cache` - Update an existing key
//! - `DELETE /cache/:key` - Delete a key
//! - `GET /health` - Health check endpoint

pub mod caller;
pub mod handlers;
pub mod routes;

pub use caller::Caller;
pub use handlers::*;
pub use routes::create_router;
