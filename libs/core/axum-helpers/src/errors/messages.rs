//! Client-facing error details shared by the gateway handlers.
//!
//! Backend causes are logged, never echoed.

pub const RECEIVE_PAYLOAD: &str = "Error receiving payload";
pub const DECODE_PAYLOAD: &str = "Error decoding payload";
pub const HANDLE_TASK: &str = "Error handling task";
pub const POP_TASK: &str = "Error popping job from queue";
pub const PURGE_QUEUE: &str = "Error purging queue";
pub const ENCODE_RESPONSE: &str = "Error encoding response";
pub const NOT_FOUND: &str = "Not found";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
