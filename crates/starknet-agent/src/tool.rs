use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::errors::AgentResult;
use crate::models::starknet::{
    Block, BridgeMessage, ContractStats, Event, NftContract, TokenTransfer, Transaction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolCategory {
    Transaction,
    Nft,
    Analytics,
    Market,
    Block,
    Event,
    Message,
}

/// What a tool hands back: the data it fetched plus the LLM's reading of it.
///
/// Serializes as a flat object, e.g. `{"blocks": [...], "analysis": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Transaction {
        transaction: Transaction,
        analysis: String,
    },
    Blocks {
        blocks: Vec<Block>,
        analysis: String,
    },
    Events {
        events: Vec<Event>,
        analysis: String,
    },
    ContractMetrics {
        stats: ContractStats,
        volume: String,
        analysis: String,
    },
    NftActivity {
        contract: NftContract,
        transfers: Vec<TokenTransfer>,
        analysis: String,
    },
    BridgeMessages {
        #[serde(rename = "l2ToL1Messages")]
        l2_to_l1_messages: Vec<BridgeMessage>,
        #[serde(rename = "l1ToL2Messages")]
        l1_to_l2_messages: Vec<BridgeMessage>,
        analysis: String,
    },
    /// Output of tools registered by an embedding application
    Custom { data: Value, analysis: String },
}

impl ToolOutput {
    pub fn analysis(&self) -> &str {
        match self {
            ToolOutput::Transaction { analysis, .. }
            | ToolOutput::Blocks { analysis, .. }
            | ToolOutput::Events { analysis, .. }
            | ToolOutput::ContractMetrics { analysis, .. }
            | ToolOutput::NftActivity { analysis, .. }
            | ToolOutput::BridgeMessages { analysis, .. }
            | ToolOutput::Custom { analysis, .. } => analysis,
        }
    }
}

/// A named unit of work the planner can ask for
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the plan refers to
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn category(&self) -> ToolCategory;

    /// JSON schema of the accepted parameters, shown to the planner
    fn parameters(&self) -> Value;

    /// Fetch the data and analyze it
    async fn execute(&self, params: Value) -> AgentResult<ToolOutput>;
}
