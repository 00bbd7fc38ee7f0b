//! Read-only client for the StarkScan REST API.
//!
//! Every method issues a single authenticated GET and decodes the JSON body into
//! the matching entity from [`crate::models::starknet`]. Failures of any kind are
//! reported as [`AgentError::DataClientRequestFailed`].
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::errors::{AgentError, AgentResult};
use crate::models::starknet::{
    Block, BridgeMessage, Contract, ContractStats, Event, NftBalance, NftContract, NftHolder,
    TokenTransfer, Transaction,
};

pub const STARKSCAN_HOST: &str = "https://api.starkscan.com/v1";
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone, Deserialize)]
pub struct StarkScanConfig {
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl StarkScanConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl fmt::Debug for StarkScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarkScanConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

type Query = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct StarkScanClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StarkScanClient {
    pub fn new(config: StarkScanConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AgentError::DataClientRequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| STARKSCAN_HOST.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// `{base_url}/{segments...}`, each segment percent-encoded so ids cannot
    /// change the path or add a query
    fn url(&self, segments: &[&str]) -> AgentResult<Url> {
        let invalid = || {
            AgentError::DataClientRequestFailed(format!("Invalid base URL: {}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, segments: &[&str], query: &Query) -> AgentResult<Response> {
        let url = self.url(segments)?;
        let endpoint = url.path().to_string();
        tracing::debug!(endpoint = %endpoint, "StarkScan request");

        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| AgentError::DataClientRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::DataClientRequestFailed(format!(
                "Request to {} failed: {} - {}",
                endpoint, status, error_text
            )));
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: Query) -> AgentResult<T> {
        let response = self.send(segments, &query).await?;
        let endpoint = response.url().path().to_string();
        response.json().await.map_err(|e| {
            AgentError::DataClientRequestFailed(format!(
                "Invalid response from {}: {}",
                endpoint, e
            ))
        })
    }

    // Block APIs

    pub async fn get_block(&self, block_number: u64) -> AgentResult<Block> {
        self.get(&["block", &block_number.to_string()], vec![]).await
    }

    pub async fn get_latest_blocks(&self, limit: u32) -> AgentResult<Vec<Block>> {
        self.get(&["blocks"], vec![("limit", limit.to_string())]).await
    }

    // Transaction APIs

    pub async fn get_transaction(&self, hash: &str) -> AgentResult<Transaction> {
        self.get(&["transaction", hash], vec![]).await
    }

    pub async fn get_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> AgentResult<Vec<Transaction>> {
        self.get(
            &["transactions"],
            vec![
                ("address", address.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // Event APIs

    pub async fn get_contract_events(
        &self,
        contract_address: &str,
        from_block: Option<u64>,
        limit: u32,
    ) -> AgentResult<Vec<Event>> {
        let mut query = vec![("contract", contract_address.to_string())];
        if let Some(from_block) = from_block {
            query.push(("from_block", from_block.to_string()));
        }
        query.push(("limit", limit.to_string()));
        self.get(&["events"], query).await
    }

    // Contract APIs

    pub async fn get_contract(&self, address: &str) -> AgentResult<Contract> {
        self.get(&["contract", address], vec![]).await
    }

    pub async fn get_contract_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> AgentResult<Vec<Transaction>> {
        self.get(
            &["contract", address, "transactions"],
            vec![("limit", limit.to_string())],
        )
        .await
    }

    // Message APIs

    pub async fn get_l2_to_l1_messages(
        &self,
        from_address: &str,
        limit: u32,
    ) -> AgentResult<Vec<BridgeMessage>> {
        self.get(
            &["messages", "l2-to-l1"],
            vec![
                ("from_address", from_address.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn get_l1_to_l2_messages(
        &self,
        to_address: &str,
        limit: u32,
    ) -> AgentResult<Vec<BridgeMessage>> {
        self.get(
            &["messages", "l1-to-l2"],
            vec![
                ("to_address", to_address.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    // NFT APIs

    pub async fn get_nft_contract(&self, address: &str) -> AgentResult<NftContract> {
        self.get(&["nft", "contract", address], vec![]).await
    }

    pub async fn get_nft_transfers(
        &self,
        contract_address: &str,
        limit: u32,
    ) -> AgentResult<Vec<TokenTransfer>> {
        self.get(
            &["nft", contract_address, "transfers"],
            vec![("limit", limit.to_string())],
        )
        .await
    }

    pub async fn get_nft_balance(
        &self,
        contract_address: &str,
        owner_address: &str,
    ) -> AgentResult<Vec<NftBalance>> {
        self.get(
            &["nft", contract_address, "balance"],
            vec![("owner", owner_address.to_string())],
        )
        .await
    }

    pub async fn get_nft_holders(
        &self,
        contract_address: &str,
        limit: u32,
    ) -> AgentResult<Vec<NftHolder>> {
        self.get(
            &["nft", contract_address, "holders"],
            vec![("limit", limit.to_string())],
        )
        .await
    }

    // Analytics APIs

    pub async fn get_contract_stats(&self, address: &str) -> AgentResult<ContractStats> {
        self.get(&["stats", "contract", address], vec![]).await
    }

    /// The volume endpoint answers with a bare value, either a JSON string or plain text
    pub async fn get_token_transfer_volume(&self, contract_address: &str) -> AgentResult<String> {
        let body = self
            .send(
                &["stats", "token-transfer-volume", contract_address],
                &Query::new(),
            )
            .await?
            .text()
            .await
            .map_err(|e| AgentError::DataClientRequestFailed(e.to_string()))?;

        Ok(match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(volume)) => volume,
            Ok(other) => other.to_string(),
            Err(_) => body.trim().to_string(),
        })
    }
}
