use bitcoin::hex::FromHex;
use bitcoin::{Amount, BlockHash, TxMerkleNode, Txid};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::codec::{parse_coin_amount, parse_integer_optional};
use crate::error::CoreError;
use crate::types::{BlockHeader, BlockHeight, BlockInfo};

#[derive(Deserialize)]
struct HeaderResponse {
    hash: BlockHash,
    #[serde(default, rename = "previousblockhash")]
    prev_hash: Option<BlockHash>,
    #[serde(default, rename = "nextblockhash")]
    next_hash: Option<BlockHash>,
    height: u32,
    confirmations: i64,
    #[serde(default)]
    size: u64,
    time: i64,
}

impl From<HeaderResponse> for BlockHeader {
    fn from(raw: HeaderResponse) -> Self {
        BlockHeader {
            hash: raw.hash,
            prev_hash: raw.prev_hash,
            next_hash: raw.next_hash,
            height: BlockHeight(raw.height),
            confirmations: raw.confirmations,
            size: raw.size,
            time: raw.time,
        }
    }
}

#[derive(Deserialize)]
struct BlockInfoResponse {
    #[serde(flatten)]
    header: HeaderResponse,
    version: i32,
    #[serde(rename = "merkleroot")]
    merkle_root: TxMerkleNode,
    nonce: u32,
    bits: String,
    difficulty: f64,
    tx: Vec<Txid>,
}

/// Deserialize an RPC `result` into `T`, reporting failures as malformed
/// payloads for `method`.
pub(super) fn from_result<T: DeserializeOwned>(
    raw: serde_json::Value,
    method: &str,
) -> Result<T, CoreError> {
    serde_json::from_value(raw)
        .map_err(|e| CoreError::MalformedPayload(format!("invalid {method} result: {e}")))
}

pub(super) fn parse_block_header(raw: serde_json::Value) -> Result<BlockHeader, CoreError> {
    from_result::<HeaderResponse>(raw, "getblockheader").map(BlockHeader::from)
}

pub(super) fn parse_block_info(raw: serde_json::Value) -> Result<BlockInfo, CoreError> {
    let info: BlockInfoResponse = from_result(raw, "getblock")?;
    Ok(BlockInfo {
        header: info.header.into(),
        version: info.version,
        merkle_root: info.merkle_root,
        nonce: info.nonce,
        bits: info.bits,
        difficulty: info.difficulty,
        txids: info.tx,
    })
}

pub(super) fn parse_hash_result<T>(raw: &serde_json::Value, method: &str) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.as_str()
        .ok_or_else(|| CoreError::MalformedPayload(format!("{method} did not return a string")))?
        .parse()
        .map_err(|e| CoreError::MalformedPayload(format!("invalid {method} result: {e}")))
}

pub(super) fn parse_raw_block(raw: &serde_json::Value) -> Result<Vec<u8>, CoreError> {
    let hex_str = raw
        .as_str()
        .ok_or_else(|| CoreError::MalformedBlock("getblock did not return hex".into()))?;
    Vec::<u8>::from_hex(hex_str)
        .map_err(|e| CoreError::MalformedBlock(format!("invalid block hex: {e}")))
}

/// `estimatesmartfee` returns `{"feerate": x, "blocks": n}`, omitting
/// `feerate` when there is not enough data.
pub(super) fn parse_smart_fee(raw: &serde_json::Value) -> Result<Option<Amount>, CoreError> {
    match raw.get("feerate") {
        Some(rate) => parse_fee_rate(rate),
        None => Ok(None),
    }
}

/// `estimatefee` reports `-1` when it has no estimate.
pub(super) fn parse_fee_rate(raw: &serde_json::Value) -> Result<Option<Amount>, CoreError> {
    if parse_integer_optional::<i64, true>(Some(raw)).is_some_and(|n| n < 0)
        || raw.as_f64().is_some_and(|n| n < 0.0)
    {
        return Ok(None);
    }
    parse_coin_amount(raw).map(Some)
}
