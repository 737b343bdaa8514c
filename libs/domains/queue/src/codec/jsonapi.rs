use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Task;

/// `{"data": ...}` envelope around one task or a list of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

impl<T> Document<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// One resource under `data`: either a flat task object or a resource
/// object carrying the task in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource(pub Task);

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut value = serde_json::Value::deserialize(deserializer)?;
        let attributes = value
            .as_object_mut()
            .and_then(|object| object.remove("attributes"));
        let task = attributes.unwrap_or(value);

        Task::deserialize(task)
            .map(Resource)
            .map_err(serde::de::Error::custom)
    }
}

/// What a JSON:API request body decodes to, and the shape named in
/// decode error messages.
pub(crate) trait Payload: Sized {
    const EXPECTED: &'static str;
    type Data: DeserializeOwned;

    fn from_data(data: Self::Data) -> Self;
}

impl Payload for Task {
    const EXPECTED: &'static str = "{\"data\": <task object>}";
    type Data = Resource;

    fn from_data(data: Resource) -> Self {
        data.0
    }
}

impl Payload for Vec<Task> {
    const EXPECTED: &'static str = "{\"data\": [<task object>, ...]}";
    type Data = Vec<Resource>;

    fn from_data(data: Vec<Resource>) -> Self {
        data.into_iter().map(|resource| resource.0).collect()
    }
}
