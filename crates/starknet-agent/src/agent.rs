use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{AgentError, AgentResult};
use crate::memory::{MemoryEntry, MemorySystem};
use crate::models::message::Message;
use crate::plan::Plan;
use crate::prompt_template::{render_prompt, PLAN_TEMPLATE, SYNTHESIZE_TEMPLATE};
use crate::providers::base::{CompletionRequest, ModelTask, Provider};
use crate::providers::configs::LlmOptions;
use crate::providers::factory::create_provider;
use crate::starkscan::{StarkScanClient, StarkScanConfig};
use crate::tool::ToolOutput;
use crate::tools::ToolRegistry;

pub const AGENT_SYSTEM_PROMPT: &str =
    "You are an AI assistant helping to analyze StarkNet blockchain data.";
pub const PLAN_MAX_TOKENS: u32 = 500;
pub const SYNTHESIS_MAX_TOKENS: u32 = 750;

/// Everything needed to build an [`Agent`]
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub starkscan: StarkScanConfig,
    pub llm: LlmOptions,
}

#[derive(Serialize)]
struct ToolInfo<'a> {
    name: &'a str,
    description: &'a str,
    parameters: String,
}

#[derive(Serialize)]
struct PlanPrompt<'a> {
    query: &'a str,
    memory: String,
    caller_context: Option<String>,
    tool_names: Vec<&'a str>,
    tools: Vec<ToolInfo<'a>>,
}

#[derive(Serialize)]
struct SynthesisPrompt<'a> {
    results: String,
    query: &'a str,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> AgentResult<String> {
    serde_json::to_string(value).map_err(|e| AgentError::Template(e.to_string()))
}

/// Agent answers questions about StarkNet by planning tool calls with an LLM,
/// running them, and summarizing what they found
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    memory: Mutex<MemorySystem>,
}

impl Agent {
    /// Build the StarkScan client, the configured provider and the built-in tools
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        let client = StarkScanClient::new(config.starkscan)?;
        let provider = create_provider(config.llm)?;
        Ok(Self::with_parts(client, provider))
    }

    pub fn with_parts(client: StarkScanClient, provider: Arc<dyn Provider>) -> Self {
        let tools = ToolRegistry::initialize(client, Arc::clone(&provider));
        Self::from_registry(provider, tools)
    }

    pub fn from_registry(provider: Arc<dyn Provider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            memory: Mutex::new(MemorySystem::new()),
        }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names().into_iter().map(String::from).collect()
    }

    pub fn memory_entries(&self) -> Vec<MemoryEntry> {
        self.memory().entries().to_vec()
    }

    pub fn relevant_context(&self, query: &str) -> Vec<MemoryEntry> {
        self.memory().relevant_context(query)
    }

    pub fn clear_memory(&self) {
        self.memory().clear();
    }

    // The lock is only held for a read or an append, never across an await.
    // Concurrent `process` calls append in completion order.
    fn memory(&self) -> MutexGuard<'_, MemorySystem> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `query`. Any failure aborts the whole call, records nothing,
    /// and is returned wrapped in [`AgentError::Processing`].
    pub async fn process(&self, query: &str, context: Option<&Value>) -> AgentResult<String> {
        self.run(query, context).await.map_err(|e| {
            tracing::error!("Processing failed: {}", e);
            AgentError::Processing(Box::new(e))
        })
    }

    async fn run(&self, query: &str, context: Option<&Value>) -> AgentResult<String> {
        let memory_context = self.relevant_context(query);

        let plan = self
            .create_analysis_plan(query, &memory_context, context)
            .await?;
        let results = self.execute_analysis_plan(plan).await?;
        let response = self.synthesize_response(&results, query).await?;

        tracing::debug!(results = results.len(), "Recording interaction");
        self.memory()
            .add_entry(MemoryEntry::new(query, results, response.clone()));

        Ok(response)
    }

    fn request(&self, prompt: String, max_tokens: u32, task: ModelTask) -> CompletionRequest {
        let request = CompletionRequest::new(vec![
            Message::system().with_text(AGENT_SYSTEM_PROMPT),
            Message::user().with_text(prompt),
        ])
        .with_max_tokens(max_tokens);

        match self.provider.model_for_task(task) {
            Some(model) => request.with_model(model),
            None => request,
        }
    }

    async fn create_analysis_plan(
        &self,
        query: &str,
        memory_context: &[MemoryEntry],
        caller_context: Option<&Value>,
    ) -> AgentResult<Plan> {
        tracing::info!("Planning analysis");

        let tools = self
            .tools
            .tools()
            .map(|tool| {
                Ok(ToolInfo {
                    name: tool.name(),
                    description: tool.description(),
                    parameters: to_json(&tool.parameters())?,
                })
            })
            .collect::<AgentResult<Vec<_>>>()?;

        let prompt = render_prompt(
            PLAN_TEMPLATE,
            &PlanPrompt {
                query,
                memory: to_json(memory_context)?,
                caller_context: caller_context.map(to_json).transpose()?,
                tool_names: self.tools.names(),
                tools,
            },
        )?;

        let response = self
            .provider
            .complete(&self.request(prompt, PLAN_MAX_TOKENS, ModelTask::Reasoning))
            .await?;

        Plan::parse(&response.content)
    }

    async fn execute_analysis_plan(&self, plan: Plan) -> AgentResult<Vec<ToolOutput>> {
        let steps = plan.resolve(&self.tools);
        tracing::info!(steps = steps.len(), "Executing analysis plan");

        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let output = self
                .tools
                .execute(&step.tool, Value::Object(step.params))
                .await?;
            results.push(output);
        }
        Ok(results)
    }

    async fn synthesize_response(
        &self,
        results: &[ToolOutput],
        query: &str,
    ) -> AgentResult<String> {
        tracing::info!("Synthesizing response");

        let prompt = render_prompt(
            SYNTHESIZE_TEMPLATE,
            &SynthesisPrompt {
                results: to_json(results)?,
                query,
            },
        )?;

        let response = self
            .provider
            .complete(&self.request(prompt, SYNTHESIS_MAX_TOKENS, ModelTask::Synthesis))
            .await?;

        Ok(response.content)
    }
}
