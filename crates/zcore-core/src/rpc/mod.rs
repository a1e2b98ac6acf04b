//! Daemon RPC abstraction layer.
//!
//! Defines the [`DaemonRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).

pub(crate) mod error_map;
mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use error_map::map_daemon_error;
pub use http_adapter::HttpRpcClient;
pub use types::{BlockchainInfo, DaemonInfo};

use async_trait::async_trait;
use bitcoin::{Amount, BlockHash, Txid};

use crate::error::CoreError;
use crate::types::{BlockHeader, BlockHeight, BlockInfo};

/// The daemon RPC methods the backend consumes.
///
/// Implementations handle authentication, transport, and response decoding,
/// and report daemon errors already mapped through [`map_daemon_error`].
#[async_trait]
pub trait DaemonRpc: Send + Sync {
    /// `getblockchaininfo`.
    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, CoreError>;

    /// Legacy `getinfo` (daemon version, protocol version, clock offset).
    async fn get_info(&self) -> Result<DaemonInfo, CoreError>;

    /// `getbestblockhash`.
    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError>;

    /// `getblockhash <height>`: hash of the active chain's block at `height`.
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError>;

    /// `getblockheader <hash> true`.
    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError>;

    /// Height of the block with the given hash. Implementations may cache
    /// this, since a block's height never changes.
    async fn get_block_height(&self, hash: &BlockHash) -> Result<BlockHeight, CoreError> {
        Ok(self.get_block_header(hash).await?.height)
    }

    /// `getblock <hash> true`: header fields plus the contained txids.
    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError>;

    /// `getblock <hash> false`: the block's raw wire bytes.
    async fn get_block_raw(&self, hash: &BlockHash) -> Result<Vec<u8>, CoreError>;

    /// `getrawtransaction <txid> 1`, undecoded.
    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError>;

    /// `decoderawtransaction <hex>`, undecoded.
    async fn decode_raw_transaction(&self, hex: &str) -> Result<serde_json::Value, CoreError>;

    /// `sendrawtransaction <hex>`.
    async fn send_raw_transaction(&self, hex: &str) -> Result<Txid, CoreError>;

    /// `estimatesmartfee <blocks>`; `None` when the daemon has no estimate.
    async fn estimate_smart_fee(&self, blocks: u16) -> Result<Option<Amount>, CoreError>;

    /// `estimatefee <blocks>`; `None` when the daemon has no estimate.
    async fn estimate_fee(&self, blocks: u16) -> Result<Option<Amount>, CoreError>;
}
