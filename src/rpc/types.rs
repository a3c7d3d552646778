use num_bigint::BigUint;
use serde::Deserialize;

use crate::numeric::{deserialize_opt_quantity, deserialize_quantity};

/// Block as returned by `eth_getBlockByNumber(number, true)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    #[serde(deserialize_with = "deserialize_quantity")]
    pub number: BigUint,
    pub hash: String,
    pub miner: String,
    /// Seconds since the Unix epoch.
    #[serde(deserialize_with = "deserialize_quantity")]
    pub timestamp: BigUint,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    /// `None` for contract creation.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub value: BigUint,
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub gas_price: Option<BigUint>,
    #[serde(default)]
    pub input: String,
}

/// Receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub gas_used: BigUint,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_quantity")]
    pub effective_gas_price: Option<BigUint>,
}
