use crate::{env_or_default, env_required, ConfigError, FromEnv};
use std::env;
use std::fmt;
use tracing::error;

const QUEUE_VAR_MARKER: &str = "KEWPIE_QUEUE_";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Which queue engine backs the gateway
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Process-local queues, lost on restart
    Memory,
    /// Sorted-set queues in a Redis server
    Redis { url: String },
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Redis { .. } => "redis",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Queue backend selection and the queue names the gateway serves
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub backend: Backend,
    pub queues: Vec<String>,
}

impl QueueConfig {
    pub fn new(backend: Backend, queues: Vec<String>) -> Self {
        Self { backend, queues }
    }

    /// Collects queue names from every variable whose name contains
    /// `KEWPIE_QUEUE_`. Result is sorted and de-duplicated.
    pub fn queue_names_from<I>(vars: I) -> Vec<String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut queues: Vec<String> = vars
            .into_iter()
            .filter(|(key, _)| key.contains(QUEUE_VAR_MARKER))
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
            .collect();
        queues.sort();
        queues.dedup();
        queues
    }
}

impl FromEnv for QueueConfig {
    /// Reads from environment variables:
    /// - KEWPIE_BACKEND: required, `memory` or `redis`
    /// - KEWPIE_QUEUE_*: one queue name per variable
    /// - REDIS_URL: redis backend only, defaults to redis://127.0.0.1:6379
    fn from_env() -> Result<Self, ConfigError> {
        let backend = match env_required("KEWPIE_BACKEND")?.to_ascii_lowercase().as_str() {
            "memory" => Backend::Memory,
            "redis" => Backend::Redis {
                url: env_or_default("REDIS_URL", DEFAULT_REDIS_URL),
            },
            other => {
                return Err(ConfigError::ParseError {
                    key: "KEWPIE_BACKEND".to_string(),
                    details: format!("unknown backend '{}', expected 'memory' or 'redis'", other),
                });
            }
        };

        let queues = Self::queue_names_from(env::vars());
        if queues.is_empty() {
            error!("no queues configured. Set env vars in the form KEWPIE_QUEUE_FOO=foo_bar");
        }

        Ok(Self { backend, queues })
    }
}
