use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};

use super::base::{CompletionResponse, Usage};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;

pub fn build_client(provider: &str) -> AgentResult<Client> {
    Client::builder()
        .build()
        .map_err(|e| AgentError::provider(provider, e))
}

/// Turn an HTTP response into its JSON body, or a provider error for non-2xx statuses
pub async fn handle_response(provider: &str, response: Response) -> AgentResult<Value> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| AgentError::provider(provider, format!("Invalid JSON response: {}", e)));
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(AgentError::provider(
        provider,
        format!("Request failed: {} - {}", status, error_text),
    ))
}

/// Add `key` to a JSON object payload only when the value is present
pub fn insert_if_some<T: Serialize>(payload: &mut Value, key: &str, value: Option<T>) {
    if let (Some(object), Some(value)) = (payload.as_object_mut(), value) {
        object.insert(key.to_string(), json!(value));
    }
}

/// OpenAI-style chat messages; roles and content already match the wire format
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

pub fn get_openai_usage(data: &Value) -> Option<Usage> {
    let usage = data.get("usage")?;

    let prompt_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32);

    let completion_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .or_else(|| match (prompt_tokens, completion_tokens) {
            (Some(prompt), Some(completion)) => Some(prompt + completion),
            _ => None,
        });

    Some(Usage::new(prompt_tokens, completion_tokens, total_tokens))
}

/// Convert an OpenAI-compatible chat completion into the internal response
pub fn openai_response_to_completion(
    provider: &str,
    response: &Value,
    requested_model: &str,
) -> AgentResult<CompletionResponse> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            AgentError::provider(provider, format!("Invalid response format: {}", response))
        })?;

    let model = response
        .get("model")
        .and_then(|m| m.as_str())
        .unwrap_or(requested_model);

    Ok(CompletionResponse {
        content: content.to_string(),
        model: model.to_string(),
        usage: get_openai_usage(response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_some() {
        let mut payload = json!({"model": "gpt-4"});
        insert_if_some(&mut payload, "temperature", Some(0.5));
        insert_if_some::<u32>(&mut payload, "max_tokens", None);
        assert_eq!(payload, json!({"model": "gpt-4", "temperature": 0.5}));
    }

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::system().with_text("Be brief."),
            Message::user().with_text("How busy is the network?"),
        ];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(
            spec,
            vec![
                json!({"role": "system", "content": "Be brief."}),
                json!({"role": "user", "content": "How busy is the network?"}),
            ]
        );
    }

    #[test]
    fn test_usage_total_computed_when_missing() {
        let usage = get_openai_usage(&json!({
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        }))
        .unwrap();
        assert_eq!(usage.total_tokens, Some(7));
        assert!(get_openai_usage(&json!({})).is_none());
    }

    #[test]
    fn test_openai_response_missing_content() {
        let err = openai_response_to_completion("OpenAI", &json!({"choices": []}), "gpt-4")
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderRequestFailed { .. }));
    }

    #[test]
    fn test_openai_response_model_fallback() {
        let completion = openai_response_to_completion(
            "OpenRouter",
            &json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]}),
            "anthropic/claude-3-opus",
        )
        .unwrap();
        assert_eq!(completion.content, "hi");
        assert_eq!(completion.model, "anthropic/claude-3-opus");
        assert_eq!(completion.usage, None);
    }
}
