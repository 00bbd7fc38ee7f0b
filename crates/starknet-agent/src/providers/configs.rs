use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use super::base::ModelTask;
use super::factory::ProviderType;

// Unified enum to wrap different provider configurations
#[derive(Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Anthropic(AnthropicProviderConfig),
    Gemini(GeminiProviderConfig),
    OpenRouter(OpenRouterProviderConfig),
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenAi(_) => ProviderType::OpenAi,
            ProviderConfig::Anthropic(_) => ProviderType::Anthropic,
            ProviderConfig::Gemini(_) => ProviderType::Gemini,
            ProviderConfig::OpenRouter(_) => ProviderType::OpenRouter,
        }
    }

    /// Build the typed config for `provider_type`, keeping only the fields that variant reads
    pub fn from_parts(provider_type: ProviderType, config: LlmConfig) -> Self {
        let LlmConfig {
            api_key,
            default_model,
            base_url,
            organization,
            version,
            project_id,
            model_preferences,
        } = config;

        match provider_type {
            ProviderType::OpenAi => ProviderConfig::OpenAi(OpenAiProviderConfig {
                api_key,
                default_model,
                base_url,
                organization,
            }),
            ProviderType::Anthropic => ProviderConfig::Anthropic(AnthropicProviderConfig {
                api_key,
                default_model,
                base_url,
                version,
            }),
            ProviderType::Gemini => ProviderConfig::Gemini(GeminiProviderConfig {
                api_key,
                default_model,
                base_url,
                project_id,
            }),
            ProviderType::OpenRouter => ProviderConfig::OpenRouter(OpenRouterProviderConfig {
                api_key,
                default_model,
                base_url,
                model_preferences,
            }),
        }
    }
}

// Define specific config structs for each provider
#[derive(Clone)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub organization: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicProviderConfig {
    pub api_key: String,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    /// Value of the `anthropic-version` header
    pub version: Option<String>,
}

#[derive(Clone)]
pub struct GeminiProviderConfig {
    pub api_key: String,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Clone)]
pub struct OpenRouterProviderConfig {
    pub api_key: String,
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub model_preferences: HashMap<ModelTask, String>,
}

/// Provider settings in their untyped form, as read from a settings file or
/// handed over by an embedding application. Fields a provider does not use are ignored.
#[derive(Clone, Default, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub model_preferences: HashMap<ModelTask, String>,
}

impl LlmConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_default_model<S: Into<String>>(mut self, model: S) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("version", &self.version)
            .field("project_id", &self.project_id)
            .field("model_preferences", &self.model_preferences)
            .finish()
    }
}

/// Provider discriminant plus its settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmOptions {
    pub provider: String,
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl LlmOptions {
    pub fn new<S: Into<String>>(provider: S, config: LlmConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_deserialize_flat() {
        let options: LlmOptions = serde_json::from_value(json!({
            "provider": "openrouter",
            "api_key": "sk-test",
            "model_preferences": {"reasoning": "openai/o1", "synthesis": "anthropic/claude-3-haiku"}
        }))
        .unwrap();

        assert_eq!(options.provider, "openrouter");
        assert_eq!(options.config.api_key, "sk-test");
        assert_eq!(
            options.config.model_preferences.get(&ModelTask::Reasoning),
            Some(&"openai/o1".to_string())
        );
        assert!(options.config.base_url.is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = LlmConfig::new("sk-very-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_from_parts_keeps_variant_fields() {
        let mut config = LlmConfig::new("key").with_default_model("claude-3-haiku");
        config.version = Some("2023-06-01".to_string());
        config.organization = Some("org-ignored".to_string());

        match ProviderConfig::from_parts(ProviderType::Anthropic, config) {
            ProviderConfig::Anthropic(anthropic) => {
                assert_eq!(anthropic.version.as_deref(), Some("2023-06-01"));
                assert_eq!(anthropic.default_model.as_deref(), Some("claude-3-haiku"));
            }
            _ => panic!("Expected Anthropic config"),
        }
    }
}
