//! Conversion between request/response bodies and [`Task`]s.
//!
//! Three request encodings are understood, picked by exact `Content-Type`:
//! plain JSON, a JSON:API `{"data": ...}` envelope, and URL-encoded form
//! data (the fallback, including when the header is absent). Responses are
//! plain JSON or the JSON:API envelope, picked by `Accept`.

pub mod duration;
pub mod form;
pub mod jsonapi;

use axum_helpers::{APPLICATION_JSON, APPLICATION_JSON_API};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DecodeError;
use crate::models::Task;
use form::FormValues;
use jsonapi::{Document, Payload};

/// Encoding of an incoming request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    Json,
    JsonApi,
    Form,
}

impl RequestFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(APPLICATION_JSON) => RequestFormat::Json,
            Some(APPLICATION_JSON_API) => RequestFormat::JsonApi,
            _ => RequestFormat::Form,
        }
    }
}

/// Encoding of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    JsonApi,
}

impl ResponseFormat {
    /// Pick the response encoding from `Accept`. A missing or wildcard
    /// `Accept` mirrors a JSON:API request body.
    pub fn negotiate(accept: Option<&str>, request: RequestFormat) -> Self {
        match accept {
            Some(APPLICATION_JSON_API) => ResponseFormat::JsonApi,
            None | Some("*/*") if request == RequestFormat::JsonApi => ResponseFormat::JsonApi,
            _ => ResponseFormat::Json,
        }
    }

    /// `Content-Type` of a successful response. JSON:API bodies are labelled
    /// `application/json` unless `strict` is set.
    pub fn success_content_type(self, strict: bool) -> &'static str {
        match self {
            ResponseFormat::JsonApi if strict => APPLICATION_JSON_API,
            _ => APPLICATION_JSON,
        }
    }

    pub fn error_content_type(self) -> &'static str {
        match self {
            ResponseFormat::JsonApi => APPLICATION_JSON_API,
            ResponseFormat::Json => APPLICATION_JSON,
        }
    }
}

fn decode_json<T>(format: RequestFormat, body: &[u8]) -> Result<Option<T>, DecodeError>
where
    T: DeserializeOwned + Payload,
{
    match format {
        RequestFormat::Json => serde_json::from_slice(body)
            .map(Some)
            .map_err(DecodeError::MalformedJson),
        RequestFormat::JsonApi => serde_json::from_slice::<Document<T::Data>>(body)
            .map(|doc| Some(T::from_data(doc.into_data())))
            .map_err(|source| DecodeError::MalformedEnvelope {
                expected: T::EXPECTED,
                source,
            }),
        RequestFormat::Form => Ok(None),
    }
}

fn form_values(body: &[u8], query: Option<&str>) -> Result<FormValues, DecodeError> {
    let mut values = FormValues::parse(body)?;
    if let Some(query) = query {
        values.extend_from_urlencoded(query.as_bytes())?;
    }
    Ok(values)
}

/// Decode the body of a single publish.
pub fn decode_task(
    format: RequestFormat,
    body: &[u8],
    query: Option<&str>,
) -> Result<Task, DecodeError> {
    if let Some(task) = decode_json(format, body)? {
        return Ok(task);
    }

    let values = form_values(body, query)?;
    Ok(form::decode_tasks(&values, 1)?.pop().unwrap_or_default())
}

/// Decode the body of a publish-many, preserving input order.
pub fn decode_tasks(
    format: RequestFormat,
    body: &[u8],
    query: Option<&str>,
) -> Result<Vec<Task>, DecodeError> {
    if let Some(tasks) = decode_json(format, body)? {
        return Ok(tasks);
    }

    let values = form_values(body, query)?;
    form::decode_tasks(&values, values.values(form::BODY).len())
}

/// Serialize a task or list of tasks in the negotiated shape.
pub fn encode<T: Serialize>(value: &T, format: ResponseFormat) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        ResponseFormat::Json => serde_json::to_vec(value),
        ResponseFormat::JsonApi => serde_json::to_vec(&Document::new(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::time::Duration;

    #[test]
    fn test_request_format_is_exact_match() {
        assert_eq!(RequestFormat::from_content_type(Some("application/json")), RequestFormat::Json);
        assert_eq!(
            RequestFormat::from_content_type(Some("application/vnd.api+json")),
            RequestFormat::JsonApi
        );
        assert_eq!(
            RequestFormat::from_content_type(Some("application/json; charset=utf-8")),
            RequestFormat::Form
        );
        assert_eq!(RequestFormat::from_content_type(None), RequestFormat::Form);
    }

    #[test]
    fn test_negotiation() {
        use RequestFormat as Req;
        use ResponseFormat as Res;

        assert_eq!(Res::negotiate(Some(APPLICATION_JSON_API), Req::Form), Res::JsonApi);
        assert_eq!(Res::negotiate(Some(APPLICATION_JSON), Req::JsonApi), Res::Json);
        assert_eq!(Res::negotiate(None, Req::JsonApi), Res::JsonApi);
        assert_eq!(Res::negotiate(Some("*/*"), Req::JsonApi), Res::JsonApi);
        assert_eq!(Res::negotiate(None, Req::Json), Res::Json);
        assert_eq!(Res::negotiate(Some("text/html"), Req::JsonApi), Res::Json);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ResponseFormat::JsonApi.success_content_type(false), APPLICATION_JSON);
        assert_eq!(ResponseFormat::JsonApi.success_content_type(true), APPLICATION_JSON_API);
        assert_eq!(ResponseFormat::Json.success_content_type(true), APPLICATION_JSON);
        assert_eq!(ResponseFormat::JsonApi.error_content_type(), APPLICATION_JSON_API);
        assert_eq!(ResponseFormat::Json.error_content_type(), APPLICATION_JSON);
    }

    #[test]
    fn test_decode_single_json() {
        let task = decode_task(
            RequestFormat::Json,
            br#"{"body":"hello","delay":1000000000,"tags":{"a":"b"}}"#,
            None,
        )
        .unwrap();

        assert_eq!(task.body, "hello");
        assert_eq!(task.delay, Duration::from_secs(1));
        assert_eq!(task.tags.get("a").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_decode_json_api_envelope() {
        let task =
            decode_task(RequestFormat::JsonApi, br#"{"data":{"body":"wrapped"}}"#, None).unwrap();
        assert_eq!(task.body, "wrapped");

        let tasks = decode_tasks(
            RequestFormat::JsonApi,
            br#"{"data":[{"body":"one"},{"body":"two"}]}"#,
            None,
        )
        .unwrap();
        let bodies: Vec<_> = tasks.iter().map(|t| t.body.as_str()).collect();
        assert_eq!(bodies, ["one", "two"]);
    }

    #[test]
    fn test_decode_json_api_attributes() {
        let task = decode_task(
            RequestFormat::JsonApi,
            br#"{"data":{"type":"task","attributes":{"body":"nested","run_at":"2099-01-01T00:00:00.5Z"}}}"#,
            None,
        )
        .unwrap();
        assert_eq!(task.body, "nested");
        assert!(task.run_at.is_some());

        let err = decode_task(
            RequestFormat::JsonApi,
            br#"{"data":{"attributes":{"body":{"sub":"object"}}}}"#,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedEnvelope { .. }));
    }

    #[test]
    fn test_malformed_json_api_many_fails_entirely() {
        let variants: [&[u8]; 5] = [
            br#"{"data":{"body":"not a list"}}"#,
            br#"{"data":["hai"]}"#,
            br#"{"data":[{"body":"ok"},{"body":{"sub":"object"}}]}"#,
            br#"[{"body":"no envelope"}]"#,
            b"{\"data\":",
        ];

        for body in variants {
            let err = decode_tasks(RequestFormat::JsonApi, body, None).unwrap_err();
            assert!(
                matches!(err, DecodeError::MalformedEnvelope { .. }),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_malformed_plain_json() {
        assert!(matches!(
            decode_task(RequestFormat::Json, b"{not json", None),
            Err(DecodeError::MalformedJson(_))
        ));
        assert!(matches!(
            decode_tasks(RequestFormat::Json, br#"{"body":"object not array"}"#, None),
            Err(DecodeError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_form_single_takes_first_and_allows_empty_body() {
        let task = decode_task(RequestFormat::Form, b"body=a&body=b", None).unwrap();
        assert_eq!(task.body, "a");

        let empty = decode_task(RequestFormat::Form, b"", None).unwrap();
        assert_eq!(empty, Task::default());
    }

    #[test]
    fn test_form_reads_query_after_body() {
        let tasks = decode_tasks(RequestFormat::Form, b"body=first", Some("body=second&delay=1s")).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].body, "first");
        assert_eq!(tasks[0].delay, Duration::from_secs(1));
        assert_eq!(tasks[1].body, "second");
        assert_eq!(tasks[1].delay, Duration::ZERO);
    }

    #[test]
    fn test_encode_shapes() {
        let tasks = vec![Task::new("a")];

        let bare: Value = serde_json::from_slice(&encode(&tasks, ResponseFormat::Json).unwrap()).unwrap();
        assert_eq!(bare[0]["body"], json!("a"));

        let wrapped: Value =
            serde_json::from_slice(&encode(&tasks, ResponseFormat::JsonApi).unwrap()).unwrap();
        assert_eq!(wrapped["data"][0]["body"], json!("a"));

        let single: Value =
            serde_json::from_slice(&encode(&tasks[0], ResponseFormat::JsonApi).unwrap()).unwrap();
        assert_eq!(single["data"]["id"], json!(""));
    }
}
