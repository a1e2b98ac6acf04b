//! Domain types shared by the codec, the RPC layer, and the block retrieval
//! controller.
//!
//! Contains the canonical transaction record (`Tx`, `TxInput`, `TxOutput`),
//! block shapes returned to the indexing pipeline, chain info, and shared
//! newtypes like `BlockHeight`.

use bitcoin::{Amount, BlockHash, OutPoint, ScriptBuf, TxMerkleNode, Txid};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Script Type Classification
// ==============================================================================

/// Locking-script forms the address codec distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pk,
    P2pkh,
    P2sh,
    BareMultisig,
    OpReturn,
    Unknown,
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P2pk => write!(f, "p2pk"),
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2sh => write!(f, "p2sh"),
            Self::BareMultisig => write!(f, "bare_multisig"),
            Self::OpReturn => write!(f, "op_return"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ==============================================================================
// Block Height
// ==============================================================================

/// A block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

pub const GENESIS_HEIGHT: BlockHeight = BlockHeight(0);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl From<BlockHeight> for u32 {
    fn from(h: BlockHeight) -> Self {
        h.0
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Transaction Types
// ==============================================================================

/// Canonical transaction record.
///
/// `confirmations`, `time` and `block_time` only come from the daemon's
/// verbose JSON; the packed form does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    /// Raw transaction bytes, hex encoded. May be empty for records built
    /// by hand; packing then re-encodes from the structured fields.
    pub hex: String,
    pub txid: Txid,
    pub version: i32,
    pub locktime: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub confirmations: u32,
    pub time: i64,
    pub block_time: i64,
}

impl Tx {
    /// A coinbase transaction has exactly one input carrying the coinbase
    /// marker.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].coinbase.is_some()
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hex of the coinbase script; set only on coinbase inputs.
    pub coinbase: Option<String>,
    /// The outpoint being spent. `None` for coinbase inputs.
    pub prevout: Option<OutPoint>,
    /// Unlocking script. Empty for coinbase inputs, whose script lives in
    /// `coinbase`.
    pub script_sig: ScriptBuf,
    pub sequence: u32,
}

/// A transaction output. `value` is an exact count of the smallest unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    pub n: u32,
    pub script_pub_key: ScriptBuf,
    pub addresses: Vec<String>,
}

// ==============================================================================
// Block Types
// ==============================================================================

/// Header fields reported by `getblockheader` / `getblock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: BlockHash,
    pub prev_hash: Option<BlockHash>,
    pub next_hash: Option<BlockHash>,
    pub height: BlockHeight,
    /// `-1` when the block is no longer on the main chain.
    pub confirmations: i64,
    /// Serialized block size in bytes; `getblockheader` does not report it.
    pub size: u64,
    pub time: i64,
}

/// Block metadata from `getblock <hash> 1`: header plus contained txids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub header: BlockHeader,
    pub version: i32,
    pub merkle_root: TxMerkleNode,
    pub nonce: u32,
    pub bits: String,
    pub difficulty: f64,
    pub txids: Vec<Txid>,
}

/// A fully assembled block returned by the retrieval controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
}

/// A block decoded from the daemon's raw wire format.
///
/// Height and confirmations are not part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedBlock {
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub size: u64,
    pub time: i64,
    pub txs: Vec<Tx>,
}

// ==============================================================================
// Chain Info
// ==============================================================================

/// Merged view of `getblockchaininfo` and `getinfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain: String,
    pub blocks: u32,
    pub headers: u32,
    pub best_block_hash: BlockHash,
    pub difficulty: f64,
    pub version: Option<i64>,
    pub protocol_version: Option<i64>,
    pub time_offset: Option<i64>,
    pub warnings: String,
}
