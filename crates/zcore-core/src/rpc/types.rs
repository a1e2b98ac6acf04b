//! RPC-specific response shapes that do not belong to the shared domain
//! model.
//!
//! Transactions and blocks are converted straight into `crate::types`; this
//! module only covers the chain-status calls.

use bitcoin::BlockHash;
use serde::Deserialize;

// ==============================================================================
// Chain Status
// ==============================================================================

/// Fields of `getblockchaininfo` the backend uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u32,
    #[serde(default)]
    pub headers: u32,
    #[serde(rename = "bestblockhash")]
    pub best_block_hash: BlockHash,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub warnings: String,
}

/// Fields of the legacy `getinfo` call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DaemonInfo {
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default, rename = "protocolversion")]
    pub protocol_version: Option<i64>,
    #[serde(default, rename = "timeoffset")]
    pub time_offset: Option<i64>,
    #[serde(default)]
    pub errors: String,
}
