//! ChainView - a minimal block explorer for Ethereum-style nodes
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Chain Data
//! - [`rpc`] - JSON-RPC client and the [`rpc::ChainSource`] seam
//! - [`explorer`] - height resolution, recent block aggregation, transaction enrichment
//! - [`numeric`] - arbitrary-precision parsing and serialization
//!
//! ## Presentation
//! - [`format`] - short hex and ether display helpers
//! - [`render`] - HTML page rendering
//! - [`api`] - HTTP routes and static file serving
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Chain Data
// ============================================================================
pub mod explorer;
pub mod numeric;
pub mod rpc;

// ============================================================================
// Presentation
// ============================================================================
pub mod api;
pub mod format;
pub mod render;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use error::{ExplorerError, Result, RpcError};
pub use explorer::{BlockSummary, ChainSnapshot, Explorer, TransactionDetail};
