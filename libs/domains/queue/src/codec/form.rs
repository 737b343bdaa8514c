//! URL-encoded form decoding.
//!
//! Form keys are parallel arrays: the i-th task takes the i-th value of each
//! key. The number of tasks comes from the `body` key, other keys are never
//! replicated across tasks.

use chrono::DateTime;
use std::collections::BTreeMap;

use super::duration::parse_duration;
use crate::error::DecodeError;
use crate::models::Task;

pub const BODY: &str = "body";
pub const DELAY: &str = "delay";
pub const RUN_AT: &str = "run_at";
pub const NO_EXP_BACKOFF: &str = "no_exp_backoff";

/// Multi-valued form fields in the order they were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    fields: BTreeMap<String, Vec<String>>,
}

impl Extend<(String, String)> for FormValues {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, pairs: I) {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `application/x-www-form-urlencoded` data, appending to the
    /// values already held.
    pub fn extend_from_urlencoded(&mut self, input: &[u8]) -> Result<(), DecodeError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)
            .map_err(|e| DecodeError::MalformedForm(e.to_string()))?;
        self.extend(pairs);
        Ok(())
    }

    pub fn parse(input: &[u8]) -> Result<Self, DecodeError> {
        let mut values = Self::new();
        values.extend_from_urlencoded(input)?;
        Ok(values)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    /// Every value for `key`, empty when the key is absent.
    pub fn values(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value for `key`, empty when absent.
    pub fn first(&self, key: &str) -> &str {
        value_at(self.values(key), 0)
    }
}

/// Positional lookup into a parallel array: missing indices are empty.
pub fn value_at(values: &[String], index: usize) -> &str {
    values.get(index).map(String::as_str).unwrap_or("")
}

/// Build `count` tasks from positionally aligned form fields.
pub fn decode_tasks(form: &FormValues, count: usize) -> Result<Vec<Task>, DecodeError> {
    (0..count).map(|index| decode_task_at(form, index)).collect()
}

fn decode_task_at(form: &FormValues, index: usize) -> Result<Task, DecodeError> {
    let mut task = Task::new(value_at(form.values(BODY), index));

    let delay = value_at(form.values(DELAY), index);
    if !delay.is_empty() {
        task.delay = parse_duration(delay).map_err(DecodeError::InvalidDuration)?;
    }

    let run_at = value_at(form.values(RUN_AT), index);
    if !run_at.is_empty() {
        task.run_at =
            Some(DateTime::parse_from_rfc3339(run_at).map_err(DecodeError::InvalidTimestamp)?);
    }

    task.no_exp_backoff = value_at(form.values(NO_EXP_BACKOFF), index) == "true";

    Ok(task)
}
