use axum::{
    Router,
    body::{self, Body},
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::Response,
};
use axum_helpers::{health_response, messages, with_request_tracing};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use crate::codec::{self, RequestFormat, ResponseFormat};
use crate::error::{DecodeError, GatewayError};
use crate::models::Task;
use crate::port::{QueuePort, YoloHandler};
use crate::response::ResponseWriter;
use crate::routes::{Route, route};

/// Largest request body read before failing with "Error receiving payload".
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Query string of a purge: `?matching=` restricts it to bodies containing
/// the substring.
#[derive(Debug, Default, Deserialize)]
pub struct PurgeQuery {
    #[serde(default)]
    pub matching: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Label successful JSON:API responses `application/vnd.api+json`
    pub strict_json_api: bool,
    pub max_body_bytes: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            strict_json_api: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// HTTP front of a [`QueuePort`].
#[derive(Clone)]
pub struct Gateway {
    queue: Arc<dyn QueuePort>,
    options: GatewayOptions,
}

impl Gateway {
    pub fn new(queue: Arc<dyn QueuePort>, options: GatewayOptions) -> Self {
        Self { queue, options }
    }

    /// Router sending every request through [`route`], with request tracing.
    pub fn router(self) -> Router {
        with_request_tracing(Router::new().fallback(dispatch).with_state(self))
    }

    pub async fn handle(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let request_format =
            RequestFormat::from_content_type(header_str(&parts.headers, header::CONTENT_TYPE));
        let response_format =
            ResponseFormat::negotiate(header_str(&parts.headers, header::ACCEPT), request_format);
        let writer = ResponseWriter::new(response_format, self.options.strict_json_api);
        let query = parts.uri.query();

        let result = match route(&parts.method, parts.uri.path()) {
            Route::Health => return health_response(),
            Route::NotFound => return writer.not_found(),
            Route::MethodNotAllowed { allow } => return writer.method_not_allowed(allow),
            Route::Publish(queue) => self
                .publish(queue, request_format, body, query)
                .await
                .map(|task| writer.success(StatusCode::CREATED, &task)),
            Route::PublishMany(queue) => self
                .publish_many(queue, request_format, body, query)
                .await
                .map(|tasks| writer.success(StatusCode::CREATED, &tasks)),
            Route::Subscribe(queue) => self
                .subscribe(queue)
                .await
                .map(|task| writer.success(StatusCode::OK, &task)),
            Route::Purge(queue) => self
                .purge(queue, &parts.uri)
                .await
                .map(|task| writer.success(StatusCode::OK, &task)),
        };

        result.unwrap_or_else(|err| writer.error(err))
    }

    async fn read_body(&self, body: Body) -> Result<body::Bytes, DecodeError> {
        body::to_bytes(body, self.options.max_body_bytes)
            .await
            .map_err(|err| DecodeError::BodyRead(Box::new(err)))
    }

    /// Publish one task.
    #[instrument(skip(self, body, query))]
    pub async fn publish(
        &self,
        queue: &str,
        format: RequestFormat,
        body: Body,
        query: Option<&str>,
    ) -> Result<Task, GatewayError> {
        let bytes = self.read_body(body).await?;
        let task = codec::decode_task(format, &bytes, query)?;

        let task = self
            .queue
            .publish(queue, task)
            .await
            .map_err(GatewayError::backend(messages::HANDLE_TASK))?;

        tracing::info!(task_id = %task.id, "task published");
        Ok(task)
    }

    /// Publish tasks one at a time, in order. The first failure stops the
    /// batch; tasks already published stay published.
    #[instrument(skip(self, body, query))]
    pub async fn publish_many(
        &self,
        queue: &str,
        format: RequestFormat,
        body: Body,
        query: Option<&str>,
    ) -> Result<Vec<Task>, GatewayError> {
        let bytes = self.read_body(body).await?;
        let tasks = codec::decode_tasks(format, &bytes, query)?;
        let total = tasks.len();

        let mut published = Vec::with_capacity(total);
        for task in tasks {
            let task = self.queue.publish(queue, task).await.map_err(|err| {
                tracing::warn!(published = published.len(), total, "batch publish aborted");
                GatewayError::backend(messages::HANDLE_TASK)(err)
            })?;
            published.push(task);
        }

        tracing::info!(published = published.len(), "tasks published");
        Ok(published)
    }

    /// Pop one task and acknowledge it straight away. Yields an empty task
    /// when nothing is eligible.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, queue: &str) -> Result<Task, GatewayError> {
        let handler = YoloHandler::new();
        self.queue
            .pop(queue, &handler)
            .await
            .map_err(GatewayError::backend(messages::POP_TASK))?;
        Ok(handler.into_task())
    }

    /// Purge the queue, or only the tasks whose body contains `?matching=`.
    #[instrument(skip(self, uri))]
    pub async fn purge(&self, queue: &str, uri: &Uri) -> Result<Task, GatewayError> {
        let Query(params) = Query::<PurgeQuery>::try_from_uri(uri)
            .map_err(|rejection| DecodeError::MalformedQuery(rejection.body_text()))?;

        let result = if params.matching.is_empty() {
            self.queue.purge(queue).await
        } else {
            self.queue.purge_matching(queue, &params.matching).await
        };
        result.map_err(GatewayError::backend(messages::PURGE_QUEUE))?;

        Ok(Task::default())
    }
}

async fn dispatch(State(gateway): State<Gateway>, request: Request) -> Response {
    gateway.handle(request).await
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
