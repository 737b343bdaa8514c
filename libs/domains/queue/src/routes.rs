//! Method + path dispatch for the gateway.

use axum::http::Method;

pub const PUBLISH_MANY: &str = "publish-many";

/// Handler selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Health,
    Publish(&'a str),
    PublishMany(&'a str),
    Subscribe(&'a str),
    Purge(&'a str),
    MethodNotAllowed { allow: &'static str },
    NotFound,
}

/// Resolve a route. Rules are checked in order: health, publish-many,
/// any other `/queues/<name>[/...]` path by method, then not found.
pub fn route<'a>(method: &Method, path: &'a str) -> Route<'a> {
    if path == "/health" || path == "/healthz" {
        return Route::Health;
    }

    let segments: Vec<&'a str> = path.split('/').collect();
    let queue = match segments.as_slice() {
        ["", "queues", name, ..] if !name.is_empty() => *name,
        _ => return Route::NotFound,
    };

    if let [_, _, _, PUBLISH_MANY] = segments.as_slice() {
        return if *method == Method::POST {
            Route::PublishMany(queue)
        } else {
            Route::MethodNotAllowed { allow: "POST" }
        };
    }

    match *method {
        Method::POST => Route::Publish(queue),
        Method::GET => Route::Subscribe(queue),
        Method::DELETE => Route::Purge(queue),
        _ => Route::NotFound,
    }
}
