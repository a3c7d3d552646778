//! Blockchain data aggregation
//!
//! Builds a [`ChainSnapshot`] for one request:
//!
//! 1. resolve the current height (`eth_blockNumber`), fail fast on error
//! 2. walk back over the most recent `window_size` blocks
//! 3. optionally enrich one selected block with its transactions and receipts
//!
//! The two loops deliberately handle failures differently. A block that cannot
//! be fetched is logged and left out, because a dashboard with nine of ten
//! blocks is still useful. A receipt that cannot be fetched aborts the whole
//! enrichment pass, because a table where some fees are silently missing would
//! misreport financial data. Keep the two policies distinct when editing.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::Serialize;

use crate::error::{ExplorerError, Result, RpcError};
use crate::numeric::{parse_big_uint, parse_block_selection, serialize_decimal, serialize_opt_decimal};
use crate::rpc::{ChainSource, RpcBlock, RpcReceipt, RpcTransaction};

/// Number of recent blocks shown when not configured otherwise.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

// ============================================================================
// Data Model
// ============================================================================

/// Everything one page render needs. Owned by a single request.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSnapshot {
    #[serde(serialize_with = "serialize_decimal")]
    pub last_block_number: BigUint,
    #[serde(serialize_with = "serialize_opt_decimal")]
    pub selected_block_number: Option<BigUint>,
    /// Newest first, consecutive numbers except where a fetch failed.
    pub blocks: Vec<BlockSummary>,
    /// Transactions of the selected block in block order. Empty when no block
    /// is selected or enrichment failed.
    pub transactions: Vec<TransactionDetail>,
    /// Why `transactions` is empty despite a selection, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_error: Option<String>,
}

impl ChainSnapshot {
    pub fn new(last_block_number: BigUint) -> Self {
        Self {
            last_block_number,
            selected_block_number: None,
            blocks: Vec::new(),
            transactions: Vec::new(),
            enrichment_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    #[serde(serialize_with = "serialize_decimal")]
    pub number: BigUint,
    pub timestamp: DateTime<Utc>,
    pub hash: String,
    pub transaction_count: usize,
    pub miner_address: String,
}

impl BlockSummary {
    /// Summarize a fetched block. `number` is the number that was requested.
    pub fn from_rpc(number: BigUint, block: &RpcBlock) -> std::result::Result<Self, RpcError> {
        Ok(Self {
            number,
            timestamp: epoch_seconds_to_instant(&block.timestamp)?,
            hash: block.hash.clone(),
            transaction_count: block.transactions.len(),
            miner_address: block.miner.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDetail {
    pub hash: String,
    /// `None` for contract creation.
    pub to_address: Option<String>,
    #[serde(serialize_with = "serialize_decimal")]
    pub value_wei: BigUint,
    /// Lowercase hex without `0x`.
    pub input_data: String,
    /// Set only when the transaction created a contract.
    pub contract_address: Option<String>,
    /// gasPrice x gasUsed.
    #[serde(serialize_with = "serialize_decimal")]
    pub fee_wei: BigUint,
}

impl TransactionDetail {
    /// Combine a transaction with its receipt.
    pub fn from_parts(tx: RpcTransaction, receipt: RpcReceipt) -> Self {
        let gas_price = tx
            .gas_price
            .or(receipt.effective_gas_price)
            .unwrap_or_else(BigUint::zero);
        let fee_wei = gas_price * &receipt.gas_used;

        Self {
            hash: tx.hash,
            to_address: tx.to,
            value_wei: tx.value,
            input_data: normalize_input(&tx.input),
            contract_address: receipt.contract_address,
            fee_wei,
        }
    }
}

fn epoch_seconds_to_instant(seconds: &BigUint) -> std::result::Result<DateTime<Utc>, RpcError> {
    seconds
        .to_i64()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or_else(|| RpcError::Decode(format!("block timestamp {} out of range", seconds)))
}

fn normalize_input(input: &str) -> String {
    let stripped = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    match hex::decode(stripped) {
        Ok(bytes) => hex::encode(bytes),
        Err(_) => stripped.to_ascii_lowercase(),
    }
}

// ============================================================================
// View Stages
// ============================================================================

/// Progress of one snapshot build, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStage {
    Start,
    HeightResolved,
    BlocksAggregated,
    Idle,
    TransactionsEnriched,
    Failed,
}

impl fmt::Display for ViewStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ViewStage::Start => "start",
            ViewStage::HeightResolved => "height_resolved",
            ViewStage::BlocksAggregated => "blocks_aggregated",
            ViewStage::Idle => "idle",
            ViewStage::TransactionsEnriched => "transactions_enriched",
            ViewStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Explorer
// ============================================================================

/// Aggregates chain data from a shared [`ChainSource`]. Cheap to clone.
#[derive(Clone)]
pub struct Explorer {
    source: Arc<dyn ChainSource>,
    window_size: usize,
}

impl Explorer {
    pub fn new(source: Arc<dyn ChainSource>) -> Self {
        Self {
            source,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Override the number of recent blocks; values below 1 are raised to 1.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn source(&self) -> &Arc<dyn ChainSource> {
        &self.source
    }

    /// Fetch the current block height. Accepts hex or decimal encodings.
    pub async fn resolve_height(&self) -> Result<BigUint> {
        let raw = self
            .source
            .block_number_raw()
            .await
            .map_err(ExplorerError::Resolve)?;

        parse_big_uint(&raw).ok_or(ExplorerError::Parse(raw))
    }

    /// Fetch the most recent blocks up to and including `height`.
    ///
    /// Blocks that fail to load are logged and skipped; the rest keep their
    /// descending order.
    pub async fn build_snapshot(&self, height: BigUint) -> Result<ChainSnapshot> {
        let window = (&height + 1u32)
            .min(BigUint::from(self.window_size))
            .to_usize()
            .unwrap_or(self.window_size);

        let mut snapshot = ChainSnapshot::new(height);
        snapshot.blocks.reserve(window);

        for i in 0..window {
            let number = &snapshot.last_block_number - BigUint::from(i);

            match self.fetch_summary(number).await {
                Ok(summary) => snapshot.blocks.push(summary),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping block");
                }
            }
        }

        Ok(snapshot)
    }

    async fn fetch_summary(&self, number: BigUint) -> Result<BlockSummary> {
        self.source
            .block_by_number(&number)
            .await
            .and_then(|block| BlockSummary::from_rpc(number.clone(), &block))
            .map_err(|source| ExplorerError::BlockFetch { number, source })
    }

    /// Load the transactions of `block_number` into `snapshot`.
    ///
    /// Receipts are fetched one at a time in block order. The first failure
    /// aborts the pass and leaves `snapshot.transactions` empty.
    pub async fn enrich_with_transactions(
        &self,
        snapshot: &mut ChainSnapshot,
        block_number: &BigUint,
    ) -> Result<()> {
        snapshot.selected_block_number = Some(block_number.clone());
        snapshot.transactions.clear();

        let block = self
            .source
            .block_by_number(block_number)
            .await
            .map_err(|source| ExplorerError::BlockFetch {
                number: block_number.clone(),
                source,
            })?;

        let mut transactions = Vec::with_capacity(block.transactions.len());
        for tx in block.transactions {
            let receipt = self
                .source
                .transaction_receipt(&tx.hash)
                .await
                .map_err(|source| ExplorerError::ReceiptFetch {
                    hash: tx.hash.clone(),
                    source,
                })?;
            transactions.push(TransactionDetail::from_parts(tx, receipt));
        }

        snapshot.transactions = transactions;
        Ok(())
    }

    /// Entry point for the web layer. `selected` is the raw, untrusted
    /// `blocknum` parameter; anything that is not a decimal number means no
    /// selection.
    pub async fn build_chain_view(&self, selected: Option<&str>) -> Result<ChainSnapshot> {
        self.build_view(parse_block_selection(selected)).await
    }

    /// Same as [`Explorer::build_chain_view`] with an already parsed selection.
    pub async fn build_view(&self, selected: Option<BigUint>) -> Result<ChainSnapshot> {
        let mut stage = ViewStage::Start;
        tracing::debug!(%stage, source = %self.source.describe(), "chain view");

        let height = match self.resolve_height().await {
            Ok(height) => height,
            Err(e) => {
                stage = ViewStage::Failed;
                tracing::error!(%stage, error = %e, "unable to retrieve blockchain info");
                return Err(e);
            }
        };
        stage = ViewStage::HeightResolved;
        tracing::debug!(%stage, %height, "chain view");

        let mut snapshot = self.build_snapshot(height).await?;
        stage = ViewStage::BlocksAggregated;
        tracing::debug!(%stage, blocks = snapshot.blocks.len(), "chain view");

        stage = match selected {
            None => ViewStage::Idle,
            Some(number) => match self.enrich_with_transactions(&mut snapshot, &number).await {
                Ok(()) => ViewStage::TransactionsEnriched,
                Err(e) => {
                    tracing::warn!(block = %number, error = %e, "transaction enrichment failed");
                    snapshot.enrichment_error = Some(e.to_string());
                    ViewStage::Failed
                }
            },
        };
        tracing::debug!(
            %stage,
            transactions = snapshot.transactions.len(),
            "chain view"
        );

        Ok(snapshot)
    }
}
