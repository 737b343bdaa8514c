pub mod handlers;
pub mod messages;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `Content-Type` used when the caller did not ask for JSON:API.
pub const APPLICATION_JSON: &str = "application/json";

/// JSON:API media type.
pub const APPLICATION_JSON_API: &str = "application/vnd.api+json";

/// One entry of an error document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Human-readable explanation of this occurrence
    pub detail: String,
}

/// Error document returned for every failed request.
///
/// Always an array, even when there is a single error:
///
/// ```json
/// { "errors": [ { "detail": "Error decoding payload" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

impl ErrorDocument {
    pub fn single(detail: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorObject {
                detail: detail.into(),
            }],
        }
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// The carried string is the client-facing detail; callers are expected to
/// log any underlying cause before building one of these.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }

    /// Render the error document with an explicit `Content-Type`.
    pub fn render(self, content_type: &'static str) -> Response {
        let status = self.status();
        let body = Json(ErrorDocument::single(self.detail()));
        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}
