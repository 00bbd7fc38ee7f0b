use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{provider} API error: {message}")]
    ProviderRequestFailed { provider: String, message: String },

    #[error("StarkScan API error: {0}")]
    DataClientRequestFailed(String),

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("Failed to parse analysis plan: {raw_text}")]
    PlanParseFailed { raw_text: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Prompt rendering failed: {0}")]
    Template(String),

    #[error("Processing error: {0}")]
    Processing(#[source] Box<AgentError>),
}

impl AgentError {
    pub fn provider<P: Into<String>, M: std::fmt::Display>(provider: P, message: M) -> Self {
        AgentError::ProviderRequestFailed {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Unwraps a `Processing` wrapper, returning the error that aborted the call
    pub fn root(&self) -> &AgentError {
        match self {
            AgentError::Processing(inner) => inner.root(),
            other => other,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_prefix() {
        let err = AgentError::Processing(Box::new(AgentError::DataClientRequestFailed(
            "Request failed: 500".to_string(),
        )));
        assert_eq!(
            err.to_string(),
            "Processing error: StarkScan API error: Request failed: 500"
        );
        assert!(matches!(err.root(), AgentError::DataClientRequestFailed(_)));
    }

    #[test]
    fn test_provider_error_names_provider() {
        let err = AgentError::provider("Gemini", "Request failed: 401");
        assert_eq!(err.to_string(), "Gemini API error: Request failed: 401");
    }
}
