//! In-memory [`ChainSource`] for tests and offline development.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use num_bigint::BigUint;

use super::types::{RpcBlock, RpcReceipt};
use super::ChainSource;
use crate::error::RpcError;

/// Genesis time used for synthetic blocks.
pub const SYNTHETIC_GENESIS_TIME: u64 = 1_600_000_000;
/// Seconds between synthetic blocks.
pub const SYNTHETIC_BLOCK_TIME: u64 = 12;

#[derive(Debug, Default)]
pub struct MemoryChain {
    height: Option<String>,
    blocks: HashMap<BigUint, RpcBlock>,
    receipts: HashMap<String, RpcReceipt>,
    failing_blocks: HashSet<BigUint>,
    failing_receipts: HashSet<String>,
    block_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of `height + 1` empty blocks, reporting `height` as hex.
    pub fn with_empty_blocks(height: u64) -> Self {
        let mut chain = Self::new().with_height_raw(format!("0x{:x}", height));
        for n in 0..=height {
            chain = chain.with_block(synthetic_block(n));
        }
        chain
    }

    /// What `eth_blockNumber` answers, verbatim.
    pub fn with_height_raw(mut self, raw: impl Into<String>) -> Self {
        self.height = Some(raw.into());
        self
    }

    pub fn with_block(mut self, block: RpcBlock) -> Self {
        self.blocks.insert(block.number.clone(), block);
        self
    }

    pub fn with_receipt(mut self, receipt: RpcReceipt) -> Self {
        self.receipts.insert(receipt.transaction_hash.clone(), receipt);
        self
    }

    pub fn fail_block(mut self, number: u64) -> Self {
        self.failing_blocks.insert(BigUint::from(number));
        self
    }

    pub fn fail_receipt(mut self, hash: impl Into<String>) -> Self {
        self.failing_receipts.insert(hash.into());
        self
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

/// Empty block `n` with deterministic hash, miner and timestamp.
pub fn synthetic_block(n: u64) -> RpcBlock {
    RpcBlock {
        number: BigUint::from(n),
        hash: format!("0x{:064x}", n + 1),
        miner: format!("0x{:040x}", n % 3 + 1),
        timestamp: BigUint::from(SYNTHETIC_GENESIS_TIME + n * SYNTHETIC_BLOCK_TIME),
        transactions: Vec::new(),
    }
}

#[async_trait]
impl ChainSource for MemoryChain {
    async fn block_number_raw(&self) -> Result<String, RpcError> {
        self.height
            .clone()
            .ok_or_else(|| RpcError::Transport("node unreachable".to_string()))
    }

    async fn block_by_number(&self, number: &BigUint) -> Result<RpcBlock, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_blocks.contains(number) {
            return Err(RpcError::Transport(format!("connection reset fetching block {}", number)));
        }
        self.blocks
            .get(number)
            .cloned()
            .ok_or_else(|| RpcError::NotFound(format!("block {}", number)))
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<RpcReceipt, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_receipts.contains(hash) {
            return Err(RpcError::Transport(format!("connection reset fetching receipt {}", hash)));
        }
        self.receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| RpcError::NotFound(format!("receipt {}", hash)))
    }
}
