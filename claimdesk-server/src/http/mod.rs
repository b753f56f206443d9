//! HTTP server layer
//!
//! Axum server with:
//! - Cookie sessions checked against the backend on every request
//! - Server-rendered protected page and login form
//! - JSON API over the same drafts
//! - Request tracing and graceful shutdown

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
