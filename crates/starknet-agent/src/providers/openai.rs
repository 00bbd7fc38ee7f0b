use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{CompletionRequest, CompletionResponse, Provider};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    build_client, handle_response, insert_if_some, messages_to_openai_spec,
    openai_response_to_completion,
};
use crate::errors::{AgentError, AgentResult};

pub const OPENAI_HOST: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4-turbo-preview";

const PROVIDER_NAME: &str = "OpenAI";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    organization: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> AgentResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER_NAME)?,
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| OPENAI_HOST.to_string()),
            default_model: config.default_model.unwrap_or_else(|| OPENAI_MODEL.to_string()),
            organization: config.organization,
        })
    }

    async fn post(&self, payload: Value) -> AgentResult<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload);
        if let Some(organization) = &self.organization {
            request = request.header("OpenAI-Organization", organization);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::provider(PROVIDER_NAME, e))?;
        handle_response(PROVIDER_NAME, response).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.default_model
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
        insert_if_some(&mut payload, "frequency_penalty", request.frequency_penalty);
        insert_if_some(&mut payload, "presence_penalty", request.presence_penalty);

        tracing::debug!(model, "Sending OpenAI completion request");
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(AgentError::provider(PROVIDER_NAME, error));
        }

        openai_response_to_completion(PROVIDER_NAME, &response, model)
    }
}
