use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{CompletionRequest, CompletionResponse, Provider, Usage};
use super::configs::AnthropicProviderConfig;
use super::utils::{build_client, handle_response, insert_if_some};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, Role};

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
pub const ANTHROPIC_VERSION: &str = "2024-02-29";
/// The messages API requires max_tokens on every request
pub const ANTHROPIC_MAX_TOKENS: u32 = 1024;

const PROVIDER_NAME: &str = "Anthropic";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    version: String,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> AgentResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER_NAME)?,
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| ANTHROPIC_HOST.to_string()),
            default_model: config
                .default_model
                .unwrap_or_else(|| ANTHROPIC_MODEL.to_string()),
            version: config.version.unwrap_or_else(|| ANTHROPIC_VERSION.to_string()),
        })
    }

    fn get_usage(data: &Value) -> Option<Usage> {
        let usage = data.get("usage")?;
        let input_tokens = usage
            .get("input_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);
        let output_tokens = usage
            .get("output_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);
        let total_tokens = input_tokens.unwrap_or(0) + output_tokens.unwrap_or(0);

        Some(Usage::new(input_tokens, output_tokens, Some(total_tokens)))
    }

    /// System messages travel in the top-level `system` field; the rest keep their order
    fn messages_to_anthropic_spec(messages: &[Message]) -> (Option<String>, Vec<Value>) {
        let mut system = Vec::new();
        let mut anthropic_messages = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system.push(message.content.as_str()),
                Role::User | Role::Assistant => anthropic_messages.push(json!({
                    "role": message.role,
                    "content": message.content
                })),
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, anthropic_messages)
    }

    async fn post(&self, payload: Value) -> AgentResult<Value> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::provider(PROVIDER_NAME, e))?;

        handle_response(PROVIDER_NAME, response).await
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> AgentResult<CompletionResponse> {
        request.ensure_messages(PROVIDER_NAME)?;
        let model = request.model_or(&self.default_model);
        let (system, messages) = Self::messages_to_anthropic_spec(&request.messages);

        let mut payload = json!({
            "model": model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(ANTHROPIC_MAX_TOKENS)
        });
        insert_if_some(&mut payload, "system", system);
        insert_if_some(&mut payload, "temperature", request.temperature);
        insert_if_some(&mut payload, "top_p", request.top_p);

        tracing::debug!(model, "Sending Anthropic completion request");
        let response = self.post(payload).await?;

        let content = response
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|first| first.get("text"))
            .and_then(|text| text.as_str())
            .ok_or_else(|| {
                AgentError::provider(PROVIDER_NAME, "Invalid response format from Anthropic API")
            })?;

        let response_model = response
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(model);

        Ok(CompletionResponse {
            content: content.to_string(),
            model: response_model.to_string(),
            usage: Self::get_usage(&response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(response_body: Value) -> (MockServer, AnthropicProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test_api_key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = AnthropicProviderConfig {
            api_key: "test_api_key".to_string(),
            default_model: Some("claude-3-sonnet-20240229".to_string()),
            base_url: Some(mock_server.uri()),
            version: None,
        };

        let provider = AnthropicProvider::new(config).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() -> anyhow::Result<()> {
        let response_body = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": "Hello! How can I assist you today?"
            }],
            "model": "claude-3-sonnet-20240229",
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {
                "input_tokens": 12,
                "output_tokens": 15
            }
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let request = CompletionRequest::new(vec![Message::user().with_text("Hello?")]);
        let response = provider.complete(&request).await?;

        assert_eq!(response.content, "Hello! How can I assist you today?");
        assert_eq!(response.model, "claude-3-sonnet-20240229");
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(12));
        assert_eq!(usage.completion_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));

        Ok(())
    }

    #[tokio::test]
    async fn test_system_message_is_lifted() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(json!({
                "system": "You are an AI assistant analyzing StarkNet blockchain data.",
                "messages": [{"role": "user", "content": "Analyze these blocks"}],
                "max_tokens": ANTHROPIC_MAX_TOKENS
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Quiet."}],
                "model": "claude-3-opus-20240229"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = AnthropicProvider::new(AnthropicProviderConfig {
            api_key: "test_api_key".to_string(),
            default_model: None,
            base_url: Some(mock_server.uri()),
            version: None,
        })?;

        let request = CompletionRequest::new(vec![
            Message::system()
                .with_text("You are an AI assistant analyzing StarkNet blockchain data."),
            Message::user().with_text("Analyze these blocks"),
        ]);
        let response = provider.complete(&request).await?;
        assert_eq!(response.content, "Quiet.");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_content_is_provider_error() {
        let (_server, provider) = setup_mock_server(json!({"content": []})).await;
        let request = CompletionRequest::new(vec![Message::user().with_text("Hello?")]);
        let err = provider.complete(&request).await.unwrap_err();
        assert!(err.to_string().starts_with("Anthropic API error"));
    }
}
