use axum::{
    http::{HeaderValue, header},
    response::Response,
};

use super::{AppError, messages};

/// 404 with the standard error document.
pub fn not_found(content_type: &'static str) -> Response {
    AppError::NotFound(messages::NOT_FOUND.to_string()).render(content_type)
}

/// 405 with the standard error document and an `Allow` header.
pub fn method_not_allowed(allow: &'static str, content_type: &'static str) -> Response {
    let mut response =
        AppError::MethodNotAllowed(messages::METHOD_NOT_ALLOWED.to_string()).render(content_type);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    response
}
