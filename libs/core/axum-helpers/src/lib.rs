//! # Axum Helpers
//!
//! Shared HTTP plumbing for the gateway binaries.
//!
//! - **[`server`]**: serving with tracing and graceful shutdown, liveness response
//! - **[`errors`]**: the `{"errors": [...]}` document and `AppError`

pub mod errors;
pub mod server;

pub use errors::{
    APPLICATION_JSON, APPLICATION_JSON_API, AppError, ErrorDocument, ErrorObject, handlers, messages,
};
pub use server::{
    ShutdownCoordinator, create_production_app, health_response, shutdown_signal,
    with_request_tracing,
};
