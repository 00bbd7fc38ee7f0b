//! StarkScan entities, kept in the field naming the API uses on the wire.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: String,
    pub transaction_count: u64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: String,
    pub contract_address: String,
    pub entrypoint: String,
    pub max_fee: String,
    pub actual_fee: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub from_address: String,
    pub keys: Vec<String>,
    pub data: Vec<String>,
    pub block_number: u64,
    pub transaction_hash: String,
    pub timestamp: String,
}

/// Contract metadata; unlike the other entities this one is snake_case on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub address: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    pub class_hash: String,
    pub deployed_by_address: String,
    pub timestamp: String,
    pub class_version: String,
}

/// An L1<>L2 message crossing the StarkNet bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMessage {
    pub msg_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub payload: Vec<String>,
    pub nonce: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftContract {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub total_supply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftBalance {
    pub contract_address: String,
    pub owner_address: String,
    pub token_id: String,
    pub amount: String,
    #[serde(rename = "tokenURI", default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftHolder {
    pub holder_address: String,
    pub balance: String,
    pub token_count: u64,
    pub last_activity_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub daily_active_users: u64,
    pub total_transactions: u64,
    #[serde(rename = "volume24h")]
    pub volume_24h: String,
}
