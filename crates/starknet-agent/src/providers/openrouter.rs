use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::base::{CompletionRequest, CompletionResponse, ModelTask, Provider};
use super::configs::OpenRouterProviderConfig;
use super::utils::{
    build_client, handle_response, insert_if_some, messages_to_openai_spec,
    openai_response_to_completion,
};
use crate::errors::{AgentError, AgentResult};

pub const OPENROUTER_HOST: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_MODEL: &str = "anthropic/claude-3-opus";
pub const OPENROUTER_REFERER: &str = "https://starknet-ai-agent.dev";
pub const OPENROUTER_TITLE: &str = "StarkNet AI Agent SDK";

const PROVIDER_NAME: &str = "OpenRouter";

pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    model_preferences: HashMap<ModelTask, String>,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterProviderConfig) -> AgentResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER_NAME)?,
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| OPENROUTER_HOST.to_string()),
            default_model: config
                .default_model
                .unwrap_or_else(|| OPENROUTER_MODEL.to_string()),
            model_preferences: config.model_preferences,
        })
    }

    async fn post(&self, payload: Value) -> AgentResult<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", OPENROUTER_REFERER)
            .header("X-Title", OPENROUTER_TITLE)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::provider(PROVIDER_NAME, e))?;

        handle_response(PROVIDER_NAME, response).await
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn model_for_task(&self, task: ModelTask) -> Option<String> {
        self.model_preferences.get(&task).cloned()
    }

    async fn complete(&self, request: &CompletionRequest) -> AgentResult<CompletionResponse> {
        request.ensure_messages(PROVIDER_NAME)?;
        let model = request.model_or(&self.default_model);

        let mut payload = json!({
            "model": model,
            "messages": messages_to_openai_spec(&request.messages),
        });
        insert_if_some(&mut payload, "temperature", request.temperature);
        insert_if_some(&mut payload, "max_tokens", request.max_tokens);
        insert_if_some(&mut payload, "top_p", request.top_p);

        tracing::debug!(model, "Sending OpenRouter completion request");
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(AgentError::provider(PROVIDER_NAME, error));
        }

        openai_response_to_completion(PROVIDER_NAME, &response, model)
    }
}
