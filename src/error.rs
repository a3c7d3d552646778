//! Error types for ChainView
//!
//! The explorer distinguishes fatal failures (the height of the chain could not
//! be resolved) from recoverable ones (a single block in the window could not be
//! fetched). Recoverable block errors never leave the aggregator; they are logged
//! and the block is skipped. Receipt errors abort transaction enrichment only.

use num_bigint::BigUint;
use thiserror::Error;

/// Failure talking to the node over JSON-RPC.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RpcError::Decode(err.to_string())
        } else {
            RpcError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The height RPC itself failed. Fatal for the whole view.
    #[error("unable to resolve chain height: {0}")]
    Resolve(#[source] RpcError),
    /// The node returned a number that is not an integer in any known base.
    #[error("unable to parse number {0:?}")]
    Parse(String),
    /// A single block could not be fetched.
    #[error("unable to fetch block {number}: {source}")]
    BlockFetch {
        number: BigUint,
        #[source]
        source: RpcError,
    },
    /// A transaction receipt could not be fetched; enrichment is abandoned.
    #[error("unable to fetch receipt for transaction {hash}: {source}")]
    ReceiptFetch {
        hash: String,
        #[source]
        source: RpcError,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ExplorerError {
    fn from(err: toml::de::Error) -> Self {
        ExplorerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ExplorerError>;
