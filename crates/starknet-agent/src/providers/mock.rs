use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::errors::AgentResult;
use crate::providers::base::{CompletionRequest, CompletionResponse, Provider};

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<AgentResult<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of text responses
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Create a mock provider whose responses may include failures
    pub fn with_results(responses: Vec<AgentResult<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> AgentResult<CompletionResponse> {
        request.ensure_messages("Mock")?;
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        let next = if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(String::new())
        } else {
            responses.remove(0)
        };

        next.map(|content| CompletionResponse {
            content,
            model: "mock-model".to_string(),
            usage: None,
        })
    }
}
