use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::errors::{AgentError, AgentResult};
use crate::tools::ToolRegistry;

/// One planned tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The ordered tool invocations the planner asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

fn fenced_block() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?i:json)?\s*(.*?)\s*```").expect("fence pattern is valid")
    })
}

impl Plan {
    /// Parse the planner's reply. Models often wrap JSON in a markdown fence, so the
    /// body of the first fenced block is used when there is one.
    pub fn parse(raw_text: &str) -> AgentResult<Self> {
        let body = fenced_block()
            .captures(raw_text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .unwrap_or_else(|| raw_text.trim());

        serde_json::from_str(body).map_err(|e| {
            tracing::debug!("Plan did not parse: {}", e);
            AgentError::PlanParseFailed {
                raw_text: raw_text.to_string(),
            }
        })
    }

    /// Keep only the steps whose tool is registered, preserving order.
    /// Unknown tool names are dropped without error.
    pub fn resolve(self, registry: &ToolRegistry) -> Vec<PlanStep> {
        self.steps
            .into_iter()
            .filter(|step| {
                let known = registry.get(&step.tool).is_some();
                if !known {
                    tracing::debug!(tool = %step.tool, "Skipping plan step for unregistered tool");
                }
                known
            })
            .collect()
    }
}
