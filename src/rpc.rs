//! Node access for ChainView
//!
//! - [`client`] - JSON-RPC 2.0 over HTTP(S)
//! - [`types`] - wire models for blocks, transactions and receipts
//! - [`memory`] - in-memory source for tests and offline use
//!
//! The explorer core only sees the [`ChainSource`] trait, so it can be driven
//! by a live node or by an in-memory source in tests.

pub mod client;
pub mod memory;
pub mod types;

pub use client::NodeClient;
pub use memory::MemoryChain;
pub use types::{RpcBlock, RpcReceipt, RpcTransaction};

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::error::RpcError;

/// Read-only view of a node. Implementations must be safe to share between
/// concurrent requests.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current block height exactly as the node encodes it (usually `0x`-hex).
    async fn block_number_raw(&self) -> Result<String, RpcError>;

    /// Block by number, including full transaction bodies.
    async fn block_by_number(&self, number: &BigUint) -> Result<RpcBlock, RpcError>;

    /// Receipt of a mined transaction.
    async fn transaction_receipt(&self, hash: &str) -> Result<RpcReceipt, RpcError>;

    /// Human-readable location of the node, used in logs and health output.
    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
