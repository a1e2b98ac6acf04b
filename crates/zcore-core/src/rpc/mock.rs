use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{Amount, BlockHash, TxMerkleNode, Txid};

use crate::error::CoreError;
use crate::types::{BlockHeader, BlockHeight, BlockInfo};

use super::types::{BlockchainInfo, DaemonInfo};
use super::DaemonRpc;

const HASH_MARKER: u8 = 0xbb;

/// Deterministic hash the mock uses for the active-chain block at `height`.
pub fn mock_block_hash(height: BlockHeight) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&height.0.to_le_bytes());
    bytes[31] = HASH_MARKER;
    BlockHash::from_byte_array(bytes)
}

fn height_of(hash: &BlockHash) -> Option<BlockHeight> {
    let bytes = hash.to_byte_array();
    if bytes[31] != HASH_MARKER || bytes[4..31].iter().any(|b| *b != 0) {
        return None;
    }
    let mut height = [0u8; 4];
    height.copy_from_slice(&bytes[..4]);
    Some(BlockHeight(u32::from_le_bytes(height)))
}

/// An in-memory daemon for controller tests.
///
/// Blocks live at [`mock_block_hash`] of their height; the active chain ends
/// at the tip, which tests may move with [`MockRpc::set_tip`]. Every height up
/// to the tip has a header, but only blocks registered with
/// [`MockRpcBuilder::with_block`] have contents.
pub struct MockRpc {
    chain: String,
    tip: Mutex<BlockHeight>,
    blocks: HashMap<BlockHeight, Vec<Txid>>,
    transactions: HashMap<Txid, serde_json::Value>,
    failing: HashSet<Txid>,
    info_fails: bool,
    smart_fee: Option<Amount>,
    fee: Option<Amount>,
    tx_calls: AtomicUsize,
    tip_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            chain: "main".into(),
            tip: BlockHeight(0),
            blocks: HashMap::new(),
            transactions: HashMap::new(),
            failing: HashSet::new(),
            info_fails: false,
            smart_fee: None,
            fee: None,
        }
    }

    pub fn set_tip(&self, height: BlockHeight) {
        *self.tip.lock().unwrap_or_else(|e| e.into_inner()) = height;
    }

    fn tip(&self) -> BlockHeight {
        *self.tip.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of `getrawtransaction` calls served so far.
    pub fn tx_calls(&self) -> usize {
        self.tx_calls.load(Ordering::SeqCst)
    }

    /// Number of `getbestblockhash` calls served so far.
    pub fn tip_calls(&self) -> usize {
        self.tip_calls.load(Ordering::SeqCst)
    }

    /// Highest number of `getrawtransaction` calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn active_height(&self, hash: &BlockHash) -> Result<BlockHeight, CoreError> {
        height_of(hash)
            .filter(|h| *h <= self.tip())
            .ok_or(CoreError::BlockNotFound)
    }

    fn header_at(&self, height: BlockHeight) -> BlockHeader {
        let tip = self.tip();
        BlockHeader {
            hash: mock_block_hash(height),
            prev_hash: height.0.checked_sub(1).map(|h| mock_block_hash(BlockHeight(h))),
            next_hash: (height < tip).then(|| mock_block_hash(BlockHeight(height.0 + 1))),
            height,
            confirmations: i64::from(tip.0 - height.0) + 1,
            size: 0,
            time: 1_569_345_779 + i64::from(height.0) * 60,
        }
    }
}

pub struct MockRpcBuilder {
    chain: String,
    tip: BlockHeight,
    blocks: HashMap<BlockHeight, Vec<Txid>>,
    transactions: HashMap<Txid, serde_json::Value>,
    failing: HashSet<Txid>,
    info_fails: bool,
    smart_fee: Option<Amount>,
    fee: Option<Amount>,
}

impl MockRpcBuilder {
    /// Chain name reported by `getblockchaininfo`.
    pub fn with_chain(mut self, chain: &str) -> Self {
        self.chain = chain.to_owned();
        self
    }

    pub fn with_tip(mut self, height: u32) -> Self {
        self.tip = BlockHeight(height);
        self
    }

    pub fn with_block(mut self, height: u32, txids: Vec<Txid>) -> Self {
        self.blocks.insert(BlockHeight(height), txids);
        self
    }

    /// Register a verbose transaction, keyed by its `txid` field.
    pub fn with_tx(mut self, tx: serde_json::Value) -> Self {
        let txid = tx["txid"]
            .as_str()
            .and_then(|s| s.parse::<Txid>().ok())
            .expect("mock transaction needs a txid");
        self.transactions.insert(txid, tx);
        self
    }

    /// Make `getrawtransaction` fail for `txid` with a daemon error.
    pub fn with_failing_tx(mut self, txid: Txid) -> Self {
        self.failing.insert(txid);
        self
    }

    pub fn with_failing_info(mut self) -> Self {
        self.info_fails = true;
        self
    }

    pub fn with_fees(mut self, smart_fee: Option<Amount>, fee: Option<Amount>) -> Self {
        self.smart_fee = smart_fee;
        self.fee = fee;
        self
    }

    pub fn build(self) -> MockRpc {
        MockRpc {
            chain: self.chain,
            tip: Mutex::new(self.tip),
            blocks: self.blocks,
            transactions: self.transactions,
            failing: self.failing,
            info_fails: self.info_fails,
            smart_fee: self.smart_fee,
            fee: self.fee,
            tx_calls: AtomicUsize::new(0),
            tip_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DaemonRpc for MockRpc {
    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, CoreError> {
        let tip = self.tip();
        Ok(BlockchainInfo {
            chain: self.chain.clone(),
            blocks: tip.0,
            headers: tip.0,
            best_block_hash: mock_block_hash(tip),
            difficulty: 1.0,
            warnings: String::new(),
        })
    }

    async fn get_info(&self) -> Result<DaemonInfo, CoreError> {
        if self.info_fails {
            return Err(CoreError::Daemon {
                code: -32601,
                message: "Method not found".into(),
            });
        }
        Ok(DaemonInfo {
            version: Some(1_000_000),
            protocol_version: Some(70_210),
            time_offset: Some(0),
            errors: String::new(),
        })
    }

    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        self.tip_calls.fetch_add(1, Ordering::SeqCst);
        Ok(mock_block_hash(self.tip()))
    }

    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        if height > self.tip() {
            return Err(CoreError::BlockNotFound);
        }
        Ok(mock_block_hash(height))
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        let height = self.active_height(hash)?;
        Ok(self.header_at(height))
    }

    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError> {
        let height = self.active_height(hash)?;
        let txids = self
            .blocks
            .get(&height)
            .cloned()
            .ok_or(CoreError::BlockNotFound)?;
        Ok(BlockInfo {
            header: self.header_at(height),
            version: 4,
            merkle_root: TxMerkleNode::all_zeros(),
            nonce: 0,
            bits: "1e0ffff0".into(),
            difficulty: 1.0,
            txids,
        })
    }

    async fn get_block_raw(&self, _hash: &BlockHash) -> Result<Vec<u8>, CoreError> {
        Err(CoreError::BlockNotFound)
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError> {
        self.tx_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give sibling fetches a chance to start before this one completes.
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(txid) {
            return Err(CoreError::Daemon {
                code: -28,
                message: "Loading block index...".into(),
            });
        }
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::TransactionNotFound)
    }

    async fn decode_raw_transaction(&self, _hex: &str) -> Result<serde_json::Value, CoreError> {
        Err(CoreError::MalformedPayload("mock cannot decode".into()))
    }

    async fn send_raw_transaction(&self, hex: &str) -> Result<Txid, CoreError> {
        if hex.is_empty() {
            return Err(CoreError::Daemon {
                code: -22,
                message: "TX decode failed".into(),
            });
        }
        Ok(Txid::all_zeros())
    }

    async fn estimate_smart_fee(&self, _blocks: u16) -> Result<Option<Amount>, CoreError> {
        Ok(self.smart_fee)
    }

    async fn estimate_fee(&self, _blocks: u16) -> Result<Option<Amount>, CoreError> {
        Ok(self.fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_hash_encodes_height() {
        let hash = mock_block_hash(BlockHeight(20_000));
        assert_eq!(height_of(&hash), Some(BlockHeight(20_000)));
        assert_eq!(height_of(&BlockHash::all_zeros()), None);
    }

    #[tokio::test]
    async fn heights_above_tip_are_not_found() {
        let rpc = MockRpc::builder().with_tip(10).build();
        assert!(rpc.get_block_hash(BlockHeight(10)).await.is_ok());
        assert!(matches!(
            rpc.get_block_hash(BlockHeight(11)).await,
            Err(CoreError::BlockNotFound)
        ));

        rpc.set_tip(BlockHeight(11));
        assert!(rpc.get_block_hash(BlockHeight(11)).await.is_ok());
    }
}
