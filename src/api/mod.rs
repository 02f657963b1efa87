//! HTTP API layer.
//!
//! Exposes the analysis pipeline, standalone extraction and the chat
//! assistant as HTTP endpoints. Every route except `/health` sits
//! behind API key middleware.
//!
//! The router is composable — `service_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::service_router;
pub use server::{serve, ServeError};
pub use types::ApiContext;
