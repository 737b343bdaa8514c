use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Fixed liveness body.
pub const HEALTH_BODY: &str = "ok";

/// Liveness response: always `200 ok`, independent of any backend.
pub fn health_response() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        HEALTH_BODY,
    )
        .into_response()
}
