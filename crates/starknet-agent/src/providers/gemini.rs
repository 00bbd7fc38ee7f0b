use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::base::{CompletionRequest, CompletionResponse, Provider, Usage};
use super::configs::GeminiProviderConfig;
use super::utils::{build_client, handle_response, insert_if_some};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, Role};

pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com/v1";
pub const GEMINI_MODEL: &str = "gemini-pro";

const PROVIDER_NAME: &str = "Gemini";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    project_id: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> AgentResult<Self> {
        Ok(Self {
            client: build_client(PROVIDER_NAME)?,
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| GEMINI_HOST.to_string()),
            default_model: config.default_model.unwrap_or_else(|| GEMINI_MODEL.to_string()),
            project_id: config.project_id,
        })
    }

    fn get_usage(data: &Value) -> Option<Usage> {
        let metadata = data.get("usageMetadata")?;
        let count = |key: &str| metadata.get(key).and_then(|v| v.as_u64()).map(|v| v as u32);

        Some(Usage::new(
            count("promptTokenCount"),
            count("candidatesTokenCount"),
            count("totalTokenCount"),
        ))
    }

    /// Gemini has no system or assistant roles in `contents`: system text moves to
    /// `systemInstruction` and assistant turns are sent as `model`
    fn messages_to_gemini_spec(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let role = match message.role {
                Role::System => {
                    system_parts.push(json!({"text": message.content}));
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(json!({
                "role": role,
                "parts": [{"text": message.content}]
            }));
        }

        let system = (!system_parts.is_empty()).then(|| json!({"parts": system_parts}));
        (system, contents)
    }

    fn generation_config(request: &CompletionRequest) -> Value {
        let mut config = Value::Object(Map::new());
        insert_if_some(&mut config, "temperature", request.temperature);
        insert_if_some(&mut config, "maxOutputTokens", request.max_tokens);
        insert_if_some(&mut config, "topP", request.top_p);
        config
    }

    async fn post(&self, model: &str, payload: Value) -> AgentResult<Value> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        let mut query = vec![("key", self.api_key.as_str())];
        if let Some(project_id) = &self.project_id {
            query.push(("project_id", project_id.as_str()));
        }

        let response = self
            .client
            .post(&url)
            .query(&query)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::provider(PROVIDER_NAME, e.without_url()))?;

        handle_response(PROVIDER_NAME, response).await
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> AgentResult<CompletionResponse> {
        request.ensure_messages(PROVIDER_NAME)?;
        let model = request.model_or(&self.default_model);
        let (system, contents) = Self::messages_to_gemini_spec(&request.messages);

        let mut payload = json!({
            "contents": contents,
            "generationConfig": Self::generation_config(request),
        });
        insert_if_some(&mut payload, "systemInstruction", system);

        tracing::debug!(model, "Sending Gemini completion request");
        let response = self.post(model, payload).await?;

        let content = response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                AgentError::provider(PROVIDER_NAME, "Invalid response format from Gemini API")
            })?;

        Ok(CompletionResponse {
            content: content.to_string(),
            model: model.to_string(),
            usage: Self::get_usage(&response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(host: String) -> GeminiProviderConfig {
        GeminiProviderConfig {
            api_key: "test_api_key".to_string(),
            default_model: None,
            base_url: Some(host),
            project_id: None,
        }
    }

    #[tokio::test]
    async fn test_complete_basic() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(query_param("key", "test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "X"}]}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GeminiProvider::new(config(mock_server.uri()))?;
        let request = CompletionRequest::new(vec![Message::user().with_text("Say X")]);
        let response = provider.complete(&request).await?;

        assert_eq!(response.content, "X");
        assert_eq!(response.model, "gemini-pro");
        assert_eq!(response.usage, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_wire_shape() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("project_id", "starknet-analytics"))
            .and(body_partial_json(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hi"}]},
                    {"role": "model", "parts": [{"text": "Hello"}]},
                    {"role": "user", "parts": [{"text": "Summarize"}]}
                ],
                "systemInstruction": {"parts": [{"text": "Be brief."}]},
                "generationConfig": {"maxOutputTokens": 500, "topP": 0.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Done."}]}}],
                "usageMetadata": {
                    "promptTokenCount": 9,
                    "candidatesTokenCount": 2,
                    "totalTokenCount": 11
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = config(mock_server.uri());
        config.project_id = Some("starknet-analytics".to_string());
        let provider = GeminiProvider::new(config)?;

        let request = CompletionRequest::new(vec![
            Message::system().with_text("Be brief."),
            Message::user().with_text("Hi"),
            Message::assistant().with_text("Hello"),
            Message::user().with_text("Summarize"),
        ])
        .with_model("gemini-1.5-flash")
        .with_max_tokens(500)
        .with_top_p(0.5);

        let response = provider.complete(&request).await?;
        assert_eq!(response.content, "Done.");
        assert_eq!(response.model, "gemini-1.5-flash");
        assert_eq!(response.usage, Some(Usage::new(Some(9), Some(2), Some(11))));

        let received = mock_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body)?;
        assert!(body["generationConfig"].get("temperature").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_forbidden_is_provider_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&mock_server)
            .await;

        let provider = GeminiProvider::new(config(mock_server.uri())).unwrap();
        let request = CompletionRequest::new(vec![Message::user().with_text("Hi")]);
        match provider.complete(&request).await {
            Err(AgentError::ProviderRequestFailed { provider, message }) => {
                assert_eq!(provider, "Gemini");
                assert!(message.contains("403"));
            }
            other => panic!("Expected ProviderRequestFailed, got {:?}", other),
        }
    }
}
