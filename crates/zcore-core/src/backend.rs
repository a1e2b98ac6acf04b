//! Block retrieval controller and the operations the indexing pipeline
//! calls.
//!
//! [`ZcoreBackend`] owns the daemon client, the transaction codec for the
//! daemon's network, and the best-safe-height cache. Blocks are only handed
//! out once they have at least two confirmations: a request above the cached
//! safe height re-derives it from the daemon's tip, and a block that is not
//! yet deep enough is reported as [`CoreError::BlockNotFound`].

use std::sync::Arc;

use bitcoin::hex::FromHex;
use bitcoin::{Amount, BlockHash, Txid};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::address::AddressDescriptor;
use crate::codec::TxCodec;
use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::params::{params_for, NetworkParams};
use crate::rpc::{DaemonRpc, HttpRpcClient};
use crate::safe_height::SafeHeight;
use crate::types::{
    Block, BlockHeader, BlockHeight, BlockInfo, ChainInfo, ParsedBlock, Tx, GENESIS_HEIGHT,
};

pub struct ZcoreBackend {
    rpc: Arc<dyn DaemonRpc>,
    codec: TxCodec,
    safe_height: SafeHeight,
    block_fetch_concurrency: usize,
    smart_fee: bool,
}

impl ZcoreBackend {
    /// Connect to the daemon described by `config` and initialize.
    pub async fn connect(config: &BackendConfig) -> Result<Self, CoreError> {
        let rpc = HttpRpcClient::new(config)?;
        Self::initialize(Arc::new(rpc), config).await
    }

    /// Ask the daemon which chain it follows and set up the codec for it.
    pub async fn initialize(
        rpc: Arc<dyn DaemonRpc>,
        config: &BackendConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let chain = rpc.get_blockchain_info().await?.chain;
        let params = params_for(&chain);
        info!(
            chain = %chain,
            params = params.name,
            network = params.network_label(),
            "rpc: block chain selected"
        );

        Ok(Self {
            rpc,
            codec: TxCodec::new(params),
            safe_height: SafeHeight::new(),
            block_fetch_concurrency: config.block_fetch_concurrency,
            smart_fee: !config.disable_estimate_smart_fee,
        })
    }

    pub fn params(&self) -> &'static NetworkParams {
        self.codec.params()
    }

    /// `livenet` on mainnet, `testnet` everywhere else.
    pub fn network(&self) -> &'static str {
        self.params().network_label()
    }

    pub fn codec(&self) -> &TxCodec {
        &self.codec
    }

    /// Height currently cached as safe to index.
    pub fn safe_height(&self) -> BlockHeight {
        self.safe_height.get()
    }

    // ==========================================================================
    // Chain Status
    // ==========================================================================

    /// `getblockchaininfo` merged with `getinfo`. The latter is optional;
    /// when it fails its fields are left empty.
    pub async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        let chain = self.rpc.get_blockchain_info().await?;
        let daemon = match self.rpc.get_info().await {
            Ok(daemon) => Some(daemon),
            Err(e) => {
                warn!(error = %e, "getinfo failed; daemon version fields omitted");
                None
            }
        };

        let mut warnings = chain.warnings;
        if let Some(errors) = daemon.as_ref().map(|d| d.errors.as_str()) {
            if warnings.is_empty() {
                warnings = errors.to_owned();
            }
        }

        Ok(ChainInfo {
            chain: chain.chain,
            blocks: chain.blocks,
            headers: chain.headers,
            best_block_hash: chain.best_block_hash,
            difficulty: chain.difficulty,
            version: daemon.as_ref().and_then(|d| d.version),
            protocol_version: daemon.as_ref().and_then(|d| d.protocol_version),
            time_offset: daemon.as_ref().and_then(|d| d.time_offset),
            warnings,
        })
    }

    pub async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        self.rpc.get_best_block_hash().await
    }

    pub async fn get_best_block_height(&self) -> Result<BlockHeight, CoreError> {
        let hash = self.rpc.get_best_block_hash().await?;
        self.rpc.get_block_height(&hash).await
    }

    pub async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        self.rpc.get_block_hash(height).await
    }

    pub async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        self.rpc.get_block_header(hash).await
    }

    pub async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError> {
        self.rpc.get_block_info(hash).await
    }

    // ==========================================================================
    // Block Retrieval
    // ==========================================================================

    /// Fetch the block at `height` with all of its transactions.
    ///
    /// `hash` may be omitted, in which case it is looked up by height. The
    /// genesis block is returned without transactions. Any failure while
    /// fetching aborts the whole block.
    pub async fn get_block(
        &self,
        hash: Option<BlockHash>,
        height: BlockHeight,
    ) -> Result<Block, CoreError> {
        self.ensure_safe(height).await?;

        let hash = match hash {
            Some(hash) => hash,
            None => self.rpc.get_block_hash(height).await?,
        };
        let info = self.rpc.get_block_info(&hash).await?;

        let txs: Vec<Tx> = if info.header.height == GENESIS_HEIGHT {
            Vec::new()
        } else {
            // Owned ids keep the future `Send` so callers can spawn it.
            stream::iter(info.txids.iter().copied())
                .map(|txid| async move { self.get_transaction(&txid).await })
                .buffered(self.block_fetch_concurrency)
                .try_collect()
                .await?
        };

        debug!(
            height = info.header.height.0,
            %hash,
            txs = txs.len(),
            "block assembled"
        );
        Ok(Block {
            header: info.header,
            txs,
        })
    }

    /// Fail with `BlockNotFound` unless `height` is at most one below the
    /// daemon's tip. The cache lock is never held across the RPC calls.
    async fn ensure_safe(&self, height: BlockHeight) -> Result<(), CoreError> {
        if height <= self.safe_height.get() {
            return Ok(());
        }

        let best = self.get_best_block_height().await?;
        let safe = match best.0.checked_sub(1) {
            Some(safe) => BlockHeight(safe),
            None => {
                debug!(%height, best = best.0, "no block below the tip yet");
                return Err(CoreError::BlockNotFound);
            }
        };
        // The safe height must resolve on the active chain before it is cached.
        self.rpc.get_block_hash(safe).await?;

        if height > safe {
            debug!(%height, safe_height = safe.0, "block not yet safe to index");
            return Err(CoreError::BlockNotFound);
        }
        let cached = self.safe_height.advance(safe);
        debug!(%height, safe_height = cached.0, "safe height advanced");
        Ok(())
    }

    /// `getblock <hash> 0`.
    pub async fn get_block_raw(&self, hash: &BlockHash) -> Result<Vec<u8>, CoreError> {
        self.rpc.get_block_raw(hash).await
    }

    // ==========================================================================
    // Transactions
    // ==========================================================================

    pub async fn get_transaction(&self, txid: &Txid) -> Result<Tx, CoreError> {
        let raw = self.rpc.get_raw_transaction(txid).await?;
        self.codec.tx_from_json(&raw)
    }

    pub async fn decode_raw_transaction(&self, hex: &str) -> Result<Tx, CoreError> {
        let raw = self.rpc.decode_raw_transaction(hex).await?;
        self.codec.tx_from_json(&raw)
    }

    pub async fn send_raw_transaction(&self, hex: &str) -> Result<Txid, CoreError> {
        self.rpc.send_raw_transaction(hex).await
    }

    /// Fee rate per kilobyte for confirmation within `blocks`, or `None` when
    /// the daemon has no estimate.
    pub async fn estimate_fee(&self, blocks: u16) -> Result<Option<Amount>, CoreError> {
        if self.smart_fee {
            self.rpc.estimate_smart_fee(blocks).await
        } else {
            self.rpc.estimate_fee(blocks).await
        }
    }

    // ==========================================================================
    // Codec Pass-Through
    // ==========================================================================

    pub fn parse_block(&self, raw: &[u8]) -> Result<ParsedBlock, CoreError> {
        self.codec.parse_block(raw)
    }

    pub fn pack_transaction(&self, tx: &Tx, height: BlockHeight) -> Result<Vec<u8>, CoreError> {
        self.codec.pack_tx(tx, height)
    }

    pub fn unpack_transaction(&self, packed: &[u8]) -> Result<(Tx, BlockHeight), CoreError> {
        self.codec.unpack_tx(packed)
    }

    pub fn address_to_descriptor(&self, address: &str) -> Result<AddressDescriptor, CoreError> {
        self.codec.address_codec().descriptor_from_address(address)
    }

    pub fn descriptor_to_addresses(
        &self,
        descriptor: &[u8],
    ) -> Result<(Vec<String>, bool), CoreError> {
        let descriptor = AddressDescriptor::from_bytes(descriptor.to_vec());
        self.codec
            .address_codec()
            .addresses_from_descriptor(&descriptor)
    }

    /// Like [`ZcoreBackend::descriptor_to_addresses`], taking the descriptor
    /// as hex.
    pub fn descriptor_hex_to_addresses(
        &self,
        descriptor: &str,
    ) -> Result<(Vec<String>, bool), CoreError> {
        let bytes = Vec::<u8>::from_hex(descriptor)
            .map_err(|e| CoreError::MalformedPayload(format!("invalid descriptor hex: {e}")))?;
        self.descriptor_to_addresses(&bytes)
    }
}
