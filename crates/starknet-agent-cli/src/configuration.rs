use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment, File};
use serde::Deserialize;
use starknet_agent::{
    providers::configs::LlmOptions, starkscan::StarkScanConfig, AgentConfig,
};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "starknet-agent.toml";
pub const ENV_PREFIX: &str = "STARKNET_AGENT";

/// Keys without a default, checked in this order before deserializing
const REQUIRED_KEYS: [&str; 3] = ["starkscan.api_key", "llm.provider", "llm.api_key"];

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub starkscan: StarkScanConfig,
    pub llm: LlmOptions,
}

impl Settings {
    /// Load from `path` (required) or from [`DEFAULT_CONFIG_FILE`] when it exists,
    /// then apply `STARKNET_AGENT_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            // Nested keys use a double underscore: STARKNET_AGENT_LLM__API_KEY
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        // Report the first absent required key by its full path
        if let Some(key) = REQUIRED_KEYS
            .iter()
            .find(|key| config.get_string(key).is_err())
        {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var(key),
            });
        }

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let Some(field) = missing_field(&err.to_string()) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    pub fn into_agent_config(self) -> AgentConfig {
        AgentConfig {
            starkscan: self.starkscan,
            llm: self.llm,
        }
    }
}

/// Dotted path of the field named by "missing field `api_key` for key `llm`"
fn missing_field(message: &str) -> Option<String> {
    let (field, rest) = message
        .strip_prefix("missing field `")?
        .split_once('`')?;

    let parent = rest
        .strip_prefix(" for key `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(key, _)| key)
        .filter(|key| !key.is_empty());

    Some(match parent {
        Some(key) => format!("{}.{}", key, field),
        None => field.to_string(),
    })
}
