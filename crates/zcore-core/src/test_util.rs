//! Shared test helpers for `zcore-core` unit tests.
//!
//! Holds the recorded mainnet transaction vector (block 20000) and builders
//! for daemon JSON payloads and raw blocks, so codec, RPC and controller
//! tests share one source of truth for fixture data.

use bitcoin::block::{self, Header};
use bitcoin::consensus::{deserialize, serialize};
use bitcoin::hashes::Hash;
use bitcoin::hex::FromHex;
use bitcoin::{
    absolute, transaction, Amount, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence,
    Transaction, TxIn, TxMerkleNode, TxOut, Txid, Witness,
};

use crate::codec::TxCodec;
use crate::params::MAINNET;
use crate::types::Tx;

// ==============================================================================
// Recorded Vector
// ==============================================================================

pub const SAMPLE_TXID: &str = "053a37155f58dea638b136cbc30a4d23343afcebb94764a9b7e3b211a3f03073";

pub const SAMPLE_TX_HEX: &str = concat!(
    "0100000002be682a41b6af8c4749cb615040e0175bf5946c48f5b65916f4d113a5be4d14ae000000006a4730",
    "4402203a18c935588165cbabd9574d6fea3f571e2bf0c215de491f29f938a39db0d5b20220689e8d189b5a08",
    "ef6bce5ef373a5fbc61ba92e6493343bc2bbe2b2089d818089012103dbb61883c633d95acca198b60362e40d",
    "88415ad539723bdf1b752a3ed9ee3e95ffffffff9c9dab1b8bf81c04b4082a0c9609cea1e57f437a6bb2af9f",
    "0947c1accf477328020000006a47304402205bd872a6ae17b908f42c940a0732855a4245ade7d118ea2b95b3",
    "322650a8a97b0220016a8f5c2f8d36975420dfd5d3d6f168d0c116e15ff86199cc5685bd78dd7c7f01210355",
    "74844d62aa130e5a5a4d96a6494deb049778c0bba25908efb7df07b3386eccffffffff020065cd1d00000000",
    "1976a91456eee85de46eca1e029701ae23dd0c8b993d59ef88ac6cac3b00000000001976a914b12ca9f42d24",
    "b05e1df9f0801f4c48e20e8c943b88ac00000000",
);

pub const SAMPLE_BLOCK_TIME: u32 = 1_569_345_779;

/// Decode a hex fixture.
pub fn hex_bytes(hex: &str) -> Vec<u8> {
    Vec::from_hex(hex).expect("fixture hex must decode")
}

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

/// Create a deterministic `BlockHash` from a single distinguishing byte.
pub fn block_hash_from_byte(b: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    BlockHash::from_byte_array(bytes)
}

// ==============================================================================
// Daemon JSON Builders
// ==============================================================================

/// The recorded transaction as `getrawtransaction <txid> 1` reports it.
pub fn sample_tx_json() -> serde_json::Value {
    serde_json::json!({
        "hex": SAMPLE_TX_HEX,
        "txid": SAMPLE_TXID,
        "version": 1,
        "locktime": 0,
        "vin": [
            {
                "txid": "ae144dbea513d1f41659b6f5486c94f55b17e0405061cb49478cafb6412a68be",
                "vout": 0,
                "scriptSig": {
                    "hex": concat!(
                        "47304402203a18c935588165cbabd9574d6fea3f571e2bf0c215de491f29f938a39db0",
                        "d5b20220689e8d189b5a08ef6bce5ef373a5fbc61ba92e6493343bc2bbe2b2089d8180",
                        "89012103dbb61883c633d95acca198b60362e40d88415ad539723bdf1b752a3ed9ee3e95"
                    )
                },
                "sequence": 4294967295u64
            },
            {
                "txid": "287347cfacc147099fafb26b7a437fe5a1ce09960c2a08b4041cf88b1bab9d9c",
                "vout": 2,
                "scriptSig": {
                    "hex": concat!(
                        "47304402205bd872a6ae17b908f42c940a0732855a4245ade7d118ea2b95b3322650a8",
                        "a97b0220016a8f5c2f8d36975420dfd5d3d6f168d0c116e15ff86199cc5685bd78dd7c",
                        "7f0121035574844d62aa130e5a5a4d96a6494deb049778c0bba25908efb7df07b3386ecc"
                    )
                },
                "sequence": 4294967295u64
            }
        ],
        "vout": [
            {
                "value": 5.0,
                "n": 0,
                "scriptPubKey": {
                    "hex": "76a91456eee85de46eca1e029701ae23dd0c8b993d59ef88ac",
                    "addresses": ["zGvK8Wns9vhdXYLa3cEPEJqokyWqJqh3bL"]
                }
            },
            {
                "value": 0.03910764,
                "n": 1,
                "scriptPubKey": {
                    "hex": "76a914b12ca9f42d24b05e1df9f0801f4c48e20e8c943b88ac",
                    "addresses": ["zR9Tvg7T1RjrgE3xfiCGrNBXbLgefdRdH3"]
                }
            }
        ],
        "confirmations": 30,
        "time": SAMPLE_BLOCK_TIME,
        "blocktime": SAMPLE_BLOCK_TIME
    })
}

/// The recorded transaction as a canonical record.
pub fn sample_tx() -> Tx {
    TxCodec::new(&MAINNET)
        .tx_from_json(&sample_tx_json())
        .expect("fixture JSON must convert")
}

/// A minimal verbose transaction with the given txid and one P2PKH output.
pub fn tx_json_with_id(txid: Txid) -> serde_json::Value {
    serde_json::json!({
        "txid": txid.to_string(),
        "version": 1,
        "locktime": 0,
        "vin": [{ "coinbase": "03204e00", "sequence": 4294967295u64 }],
        "vout": [{
            "value": 1.5,
            "n": 0,
            "scriptPubKey": { "hex": "76a91456eee85de46eca1e029701ae23dd0c8b993d59ef88ac" }
        }]
    })
}

/// Zero the fields the packed form does not persist.
pub fn without_wall_clock(mut tx: Tx) -> Tx {
    tx.confirmations = 0;
    tx.time = 0;
    tx.block_time = 0;
    tx
}

// ==============================================================================
// Raw Block Builders
// ==============================================================================

fn coinbase_tx() -> Transaction {
    Transaction {
        version: transaction::Version::ONE,
        lock_time: absolute::LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::from_bytes(vec![0x03, 0x20, 0x4e, 0x00]),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::new(),
        }],
    }
}

/// Serialize a two-transaction block (coinbase + the recorded transaction),
/// followed by `signature` bytes. Returns the raw bytes and the txids in
/// block order.
pub fn sample_block_bytes(signature: &[u8]) -> (Vec<u8>, Vec<Txid>) {
    let spend: Transaction = deserialize(&hex_bytes(SAMPLE_TX_HEX)).expect("fixture tx decodes");
    let txdata = vec![coinbase_tx(), spend];
    let txids = txdata.iter().map(Transaction::compute_txid).collect();

    let block = bitcoin::Block {
        header: Header {
            version: block::Version::ONE,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: TxMerkleNode::all_zeros(),
            time: SAMPLE_BLOCK_TIME,
            bits: CompactTarget::from_consensus(0x1e0f_fff0),
            nonce: 0,
        },
        txdata,
    };

    let mut raw = serialize(&block);
    raw.extend_from_slice(signature);
    (raw, txids)
}
