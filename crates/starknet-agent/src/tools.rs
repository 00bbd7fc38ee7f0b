//! The built-in StarkScan tools and the registry the agent dispatches plan steps through.
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::prompt_template::{render_prompt, ANALYSIS_TEMPLATE};
use crate::providers::base::{CompletionRequest, ModelTask, Provider};
use crate::starkscan::{StarkScanClient, DEFAULT_LIMIT};
use crate::tool::{Tool, ToolCategory, ToolOutput};

pub const ANALYST_SYSTEM_PROMPT: &str =
    "You are an AI assistant analyzing StarkNet blockchain data.";
pub const ANALYSIS_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum ChainToolKind {
    TransactionAnalyzer,
    BlockExplorer,
    EventMonitor,
    ContractAnalyzer,
    NftAnalyzer,
    MessageBridgeMonitor,
}

impl ChainToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChainToolKind::TransactionAnalyzer => "transactionAnalyzer",
            ChainToolKind::BlockExplorer => "blockExplorer",
            ChainToolKind::EventMonitor => "eventMonitor",
            ChainToolKind::ContractAnalyzer => "contractAnalyzer",
            ChainToolKind::NftAnalyzer => "nftAnalyzer",
            ChainToolKind::MessageBridgeMonitor => "messageBridgeMonitor",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChainToolKind::TransactionAnalyzer => "Analyzes transaction patterns and details",
            ChainToolKind::BlockExplorer => "Analyzes block activity and patterns",
            ChainToolKind::EventMonitor => "Monitors and analyzes contract events",
            ChainToolKind::ContractAnalyzer => "Analyzes contract statistics and usage patterns",
            ChainToolKind::NftAnalyzer => "Analyzes NFT contract activity and market trends",
            ChainToolKind::MessageBridgeMonitor => "Analyzes L1<>L2 message patterns",
        }
    }

    pub fn category(&self) -> ToolCategory {
        match self {
            ChainToolKind::TransactionAnalyzer => ToolCategory::Transaction,
            ChainToolKind::BlockExplorer => ToolCategory::Block,
            ChainToolKind::EventMonitor => ToolCategory::Event,
            ChainToolKind::ContractAnalyzer => ToolCategory::Analytics,
            ChainToolKind::NftAnalyzer => ToolCategory::Nft,
            ChainToolKind::MessageBridgeMonitor => ToolCategory::Message,
        }
    }

    pub fn parameters(&self) -> Value {
        let address = json!({"type": "string", "description": "Contract address"});
        let limit = json!({"type": "integer", "description": "Maximum number of items", "default": DEFAULT_LIMIT});

        match self {
            ChainToolKind::TransactionAnalyzer => json!({
                "type": "object",
                "properties": {"hash": {"type": "string", "description": "Transaction hash"}},
                "required": ["hash"]
            }),
            ChainToolKind::BlockExplorer => json!({
                "type": "object",
                "properties": {"limit": limit}
            }),
            ChainToolKind::EventMonitor => json!({
                "type": "object",
                "properties": {
                    "contractAddress": address,
                    "fromBlock": {"type": "integer", "description": "First block to include"},
                    "limit": limit
                },
                "required": ["contractAddress"]
            }),
            ChainToolKind::ContractAnalyzer | ChainToolKind::NftAnalyzer => json!({
                "type": "object",
                "properties": {"address": address},
                "required": ["address"]
            }),
            ChainToolKind::MessageBridgeMonitor => json!({
                "type": "object",
                "properties": {"address": address, "limit": limit},
                "required": ["address"]
            }),
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[derive(Deserialize)]
struct TransactionParams {
    hash: String,
}

#[derive(Deserialize)]
struct LimitParams {
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventParams {
    contract_address: String,
    #[serde(default)]
    from_block: Option<u64>,
    #[serde(default = "default_limit")]
    limit: u32,
}

#[derive(Deserialize)]
struct AddressParams {
    address: String,
}

#[derive(Deserialize)]
struct MessageParams {
    address: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> AgentResult<T> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| AgentError::InvalidParameters(format!("{}: {}", tool, e)))
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[derive(Serialize)]
struct Section {
    label: &'static str,
    data: String,
}

impl Section {
    fn new(label: &'static str, data: String) -> Self {
        Self { label, data }
    }
}

#[derive(Serialize)]
struct AnalysisPrompt<'a> {
    subject: &'a str,
    sections: Vec<Section>,
    focus: &'a [&'a str],
}

/// One of the built-in tools: fetches from StarkScan, then asks the provider to interpret it
pub struct ChainTool {
    kind: ChainToolKind,
    client: StarkScanClient,
    provider: Arc<dyn Provider>,
}

impl ChainTool {
    pub fn new(kind: ChainToolKind, client: StarkScanClient, provider: Arc<dyn Provider>) -> Self {
        Self {
            kind,
            client,
            provider,
        }
    }

    async fn analyze(
        &self,
        subject: &str,
        sections: Vec<Section>,
        focus: &[&str],
    ) -> AgentResult<String> {
        let prompt = render_prompt(
            ANALYSIS_TEMPLATE,
            &AnalysisPrompt {
                subject,
                sections,
                focus,
            },
        )?;

        let mut request = CompletionRequest::new(vec![
            Message::system().with_text(ANALYST_SYSTEM_PROMPT),
            Message::user().with_text(prompt),
        ])
        .with_max_tokens(ANALYSIS_MAX_TOKENS);
        if let Some(model) = self.provider.model_for_task(ModelTask::Analysis) {
            request = request.with_model(model);
        }

        Ok(self.provider.complete(&request).await?.content)
    }
}

#[async_trait]
impl Tool for ChainTool {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn category(&self) -> ToolCategory {
        self.kind.category()
    }

    fn parameters(&self) -> Value {
        self.kind.parameters()
    }

    async fn execute(&self, params: Value) -> AgentResult<ToolOutput> {
        let name = self.kind.name();
        tracing::debug!(tool = name, "Executing tool");

        match self.kind {
            ChainToolKind::TransactionAnalyzer => {
                let params: TransactionParams = parse_params(name, params)?;
                let transaction = self.client.get_transaction(&params.hash).await?;
                let analysis = self
                    .analyze(
                        "this transaction",
                        vec![Section::new("", pretty(&transaction))],
                        &[
                            "Transaction type and purpose",
                            "Gas usage efficiency",
                            "Contract interaction patterns",
                            "Notable characteristics",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::Transaction {
                    transaction,
                    analysis,
                })
            }
            ChainToolKind::BlockExplorer => {
                let params: LimitParams = parse_params(name, params)?;
                let blocks = self.client.get_latest_blocks(params.limit).await?;
                let analysis = self
                    .analyze(
                        "these blocks",
                        vec![Section::new("", pretty(&blocks))],
                        &[
                            "Block production patterns",
                            "Transaction density",
                            "Network activity trends",
                            "Notable characteristics",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::Blocks { blocks, analysis })
            }
            ChainToolKind::EventMonitor => {
                let params: EventParams = parse_params(name, params)?;
                let events = self
                    .client
                    .get_contract_events(&params.contract_address, params.from_block, params.limit)
                    .await?;
                let analysis = self
                    .analyze(
                        "these events",
                        vec![Section::new("", pretty(&events))],
                        &[
                            "Event patterns and frequency",
                            "Contract interaction types",
                            "Notable characteristics",
                            "Potential implications",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::Events { events, analysis })
            }
            ChainToolKind::ContractAnalyzer => {
                let params: AddressParams = parse_params(name, params)?;
                let stats = self.client.get_contract_stats(&params.address).await?;
                let volume = self.client.get_token_transfer_volume(&params.address).await?;
                let analysis = self
                    .analyze(
                        "these contract metrics",
                        vec![
                            Section::new("Stats", pretty(&stats)),
                            Section::new("Volume", volume.clone()),
                        ],
                        &[
                            "Usage patterns",
                            "Volume trends",
                            "User activity",
                            "Performance metrics",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::ContractMetrics {
                    stats,
                    volume,
                    analysis,
                })
            }
            ChainToolKind::NftAnalyzer => {
                let params: AddressParams = parse_params(name, params)?;
                let contract = self.client.get_nft_contract(&params.address).await?;
                let transfers = self
                    .client
                    .get_nft_transfers(&params.address, DEFAULT_LIMIT)
                    .await?;
                let analysis = self
                    .analyze(
                        "this NFT activity",
                        vec![
                            Section::new("Contract", pretty(&contract)),
                            Section::new("Transfers", pretty(&transfers)),
                        ],
                        &[
                            "Trading patterns",
                            "Market trends",
                            "Holder behavior",
                            "Notable activities",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::NftActivity {
                    contract,
                    transfers,
                    analysis,
                })
            }
            ChainToolKind::MessageBridgeMonitor => {
                let params: MessageParams = parse_params(name, params)?;
                let l2_to_l1_messages = self
                    .client
                    .get_l2_to_l1_messages(&params.address, params.limit)
                    .await?;
                let l1_to_l2_messages = self
                    .client
                    .get_l1_to_l2_messages(&params.address, params.limit)
                    .await?;
                let analysis = self
                    .analyze(
                        "these bridge messages",
                        vec![
                            Section::new("L2->L1", pretty(&l2_to_l1_messages)),
                            Section::new("L1->L2", pretty(&l1_to_l2_messages)),
                        ],
                        &[
                            "Message patterns",
                            "Cross-layer interactions",
                            "Bridge usage trends",
                            "Notable characteristics",
                        ],
                    )
                    .await?;
                Ok(ToolOutput::BridgeMessages {
                    l2_to_l1_messages,
                    l1_to_l2_messages,
                    analysis,
                })
            }
        }
    }
}

/// Tools by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The six built-in StarkScan tools sharing one client and one provider
    pub fn initialize(client: StarkScanClient, provider: Arc<dyn Provider>) -> Self {
        let mut registry = Self::new();
        for kind in ChainToolKind::iter() {
            registry.register(Box::new(ChainTool::new(
                kind,
                client.clone(),
                Arc::clone(&provider),
            )));
        }
        registry
    }

    /// Add a tool; a tool with the same name is replaced in place
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| &**t)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| &**t)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, params: Value) -> AgentResult<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.execute(params).await
    }
}
