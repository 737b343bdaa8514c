//! Server infrastructure module.
//!
//! - Serving with request tracing and graceful shutdown
//! - Liveness response
//! - Shutdown signal coordination

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, with_request_tracing};
pub use health::health_response;
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
