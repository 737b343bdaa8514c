//! Success and error responses in the negotiated format.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, handlers};
use serde::Serialize;
use std::error::Error as _;

use crate::codec::{self, ResponseFormat};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy)]
pub struct ResponseWriter {
    format: ResponseFormat,
    strict_json_api: bool,
}

impl ResponseWriter {
    pub fn new(format: ResponseFormat, strict_json_api: bool) -> Self {
        Self {
            format,
            strict_json_api,
        }
    }

    /// Encode `value` as the response body.
    pub fn success<T: Serialize>(&self, status: StatusCode, value: &T) -> Response {
        match codec::encode(value, self.format) {
            Ok(bytes) => {
                let content_type = self.format.success_content_type(self.strict_json_api);
                let mut response = (status, Body::from(bytes)).into_response();
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                response
            }
            Err(err) => self.error(GatewayError::Encode(err)),
        }
    }

    /// Log `err` with its cause, then render the error document.
    pub fn error(&self, err: GatewayError) -> Response {
        let app_error = AppError::from(&err);
        let status = app_error.status();
        let cause = err.source().map(ToString::to_string);

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                detail = app_error.detail(),
                cause = cause.as_deref(),
                "{}",
                err
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                detail = app_error.detail(),
                cause = cause.as_deref(),
                "{}",
                err
            );
        }

        app_error.render(self.format.error_content_type())
    }

    pub fn not_found(&self) -> Response {
        tracing::warn!(status = 404, "no route");
        handlers::not_found(self.format.error_content_type())
    }

    pub fn method_not_allowed(&self, allow: &'static str) -> Response {
        tracing::warn!(status = 405, allow, "method not allowed");
        handlers::method_not_allowed(allow, self.format.error_content_type())
    }
}
