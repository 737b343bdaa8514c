//! Queue Gateway Domain
//!
//! HTTP gateway over a task queue: publish one or many tasks to a named
//! queue, pop-and-acknowledge a task, purge a queue wholesale or by body
//! substring.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Routes    │  ← method + path → handler
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Handlers   │  ← decode, call the queue, write the response
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  QueuePort  │  ← backend trait (memory, redis)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Task and its wire format
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::queue::Backend;
//! use domain_queue::{Gateway, GatewayOptions, backends};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = backends::connect(&Backend::Memory, &["emails".to_string()]).await?;
//! let router = Gateway::new(queue, GatewayOptions::default()).router();
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod codec;
pub mod error;
pub mod handlers;
pub mod models;
pub mod port;
pub mod response;
pub mod routes;

pub use backends::{MemoryQueue, connect};
pub use codec::{RequestFormat, ResponseFormat};
pub use error::{BoxError, DecodeError, GatewayError, QueueError, QueueResult};
pub use handlers::{Gateway, GatewayOptions};
pub use models::{Tags, Task};
pub use port::{Acknowledgement, QueuePort, TaskHandler, YoloHandler};
pub use routes::{Route, route};
