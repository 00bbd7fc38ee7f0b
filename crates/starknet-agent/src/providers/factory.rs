use std::sync::Arc;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use super::{
    anthropic::AnthropicProvider,
    base::Provider,
    configs::{LlmOptions, ProviderConfig},
    gemini::GeminiProvider,
    openai::OpenAiProvider,
    openrouter::OpenRouterProvider,
};
use crate::errors::{AgentError, AgentResult};

#[derive(EnumIter, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Gemini,
    OpenRouter,
}

impl ProviderType {
    /// Resolve a provider discriminant, ignoring case
    pub fn parse(name: &str) -> AgentResult<Self> {
        let wanted = name.trim().to_lowercase();
        ProviderType::iter()
            .find(|provider_type| provider_type.to_string() == wanted)
            .ok_or_else(|| AgentError::UnsupportedProvider(name.to_string()))
    }
}

pub fn get_provider(config: ProviderConfig) -> AgentResult<Arc<dyn Provider>> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Arc::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::Anthropic(anthropic_config) => {
            Ok(Arc::new(AnthropicProvider::new(anthropic_config)?))
        }
        ProviderConfig::Gemini(gemini_config) => Ok(Arc::new(GeminiProvider::new(gemini_config)?)),
        ProviderConfig::OpenRouter(openrouter_config) => {
            Ok(Arc::new(OpenRouterProvider::new(openrouter_config)?))
        }
    }
}

pub fn create_provider(options: LlmOptions) -> AgentResult<Arc<dyn Provider>> {
    let provider_type = ProviderType::parse(&options.provider)?;
    tracing::debug!("Creating {} provider", provider_type);
    get_provider(ProviderConfig::from_parts(provider_type, options.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::LlmConfig;

    #[test]
    fn test_every_provider_type_builds() {
        for provider_type in ProviderType::iter() {
            let options = LlmOptions::new(provider_type.to_string(), LlmConfig::new("test-key"));
            let provider = create_provider(options).unwrap();
            assert!(!provider.default_model().is_empty());
            assert!(!provider.name().is_empty());
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ProviderType::parse("OpenRouter").unwrap(), ProviderType::OpenRouter);
        assert_eq!(ProviderType::parse(" gemini ").unwrap(), ProviderType::Gemini);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        for name in ["cohere", "", "open-ai"] {
            let options = LlmOptions::new(name, LlmConfig::new("test-key"));
            match create_provider(options) {
                Err(AgentError::UnsupportedProvider(got)) => assert_eq!(got, name),
                Err(other) => panic!("Expected UnsupportedProvider, got {other}"),
                Ok(_) => panic!("Expected UnsupportedProvider for {name:?}"),
            }
        }
    }

    #[test]
    fn test_default_model_override() {
        let options = LlmOptions::new(
            "anthropic",
            LlmConfig::new("test-key").with_default_model("claude-3-haiku-20240307"),
        );
        let provider = create_provider(options).unwrap();
        assert_eq!(provider.default_model(), "claude-3-haiku-20240307");
    }
}
