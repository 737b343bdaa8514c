use axum_helpers::AppError;
use axum_helpers::messages;
use thiserror::Error;

use crate::codec::duration::DurationError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures reported by a queue backend.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("task handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("task serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Why a request body could not be turned into tasks.
///
/// Each variant carries a distinct client-facing message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{detail}", detail = messages::RECEIVE_PAYLOAD)]
    BodyRead(#[source] BoxError),

    #[error("{detail}: {0}", detail = messages::DECODE_PAYLOAD)]
    MalformedJson(#[source] serde_json::Error),

    #[error("Error decoding JSON:API document, expected {expected}: {source}")]
    MalformedEnvelope {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error decoding form: {0}")]
    MalformedForm(String),

    #[error("Error decoding query string: {0}")]
    MalformedQuery(String),

    #[error("delay is not a valid duration, eg: 1s ({0})")]
    InvalidDuration(#[source] DurationError),

    #[error("run_at is not a valid RFC 3339 timestamp, eg: 2006-01-02T15:04:05Z ({0})")]
    InvalidTimestamp(#[source] chrono::ParseError),
}

/// A request that ended in an error response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{detail}: {source}")]
    Backend {
        detail: &'static str,
        #[source]
        source: QueueError,
    },

    #[error("{detail}: {0}", detail = messages::ENCODE_RESPONSE)]
    Encode(#[source] serde_json::Error),
}

impl GatewayError {
    pub fn backend(detail: &'static str) -> impl FnOnce(QueueError) -> Self {
        move |source| GatewayError::Backend { detail, source }
    }

    /// Detail shown to the caller. Backend causes stay server-side.
    pub fn client_detail(&self) -> String {
        match self {
            GatewayError::Decode(err) => err.to_string(),
            GatewayError::Backend { detail, .. } => (*detail).to_string(),
            GatewayError::Encode(_) => messages::ENCODE_RESPONSE.to_string(),
        }
    }
}

impl From<&GatewayError> for AppError {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::Decode(_) => AppError::BadRequest(err.client_detail()),
            GatewayError::Backend { .. } | GatewayError::Encode(_) => {
                AppError::InternalServerError(err.client_detail())
            }
        }
    }
}
