use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: set {env_var} or add it to the config file")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted config key, e.g. `llm.api_key`
/// becomes `STARKNET_AGENT_LLM__API_KEY`
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "STARKNET_AGENT_{}",
        field_path.replace('.', "__").to_uppercase()
    )
}
