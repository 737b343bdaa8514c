use core_config::{FromEnv, env_flag, queue::QueueConfig, server::ServerConfig};

pub use core_config::Environment;

/// Gateway configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub environment: Environment,
    /// KEWPIE_JSONAPI_STRICT
    pub strict_json_api: bool,
}

impl Config {
    pub fn from_env(environment: Environment) -> eyre::Result<Self> {
        let server = ServerConfig::from_env()?;
        let queue = QueueConfig::from_env()?;
        let strict_json_api = env_flag("KEWPIE_JSONAPI_STRICT")?;

        Ok(Self {
            server,
            queue,
            environment,
            strict_json_api,
        })
    }
}
