//! Binary forms: the packed storage layout and the daemon's raw block format.
//!
//! Packed layout: `height: u32 LE` followed by the transaction's standard
//! consensus encoding, exactly as the daemon serializes it.

use bitcoin::consensus::{deserialize, serialize, Decodable};
use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::io::Cursor;
use bitcoin::{absolute, block, transaction, OutPoint, ScriptBuf, Sequence, Transaction, TxIn};
use bitcoin::{TxOut, Witness};

use crate::error::CoreError;
use crate::types::{BlockHeight, ParsedBlock, Tx};

use super::TxCodec;

pub const PACKED_HEIGHT_LEN: usize = 4;

pub(super) fn pack_tx(tx: &Tx, height: BlockHeight) -> Result<Vec<u8>, CoreError> {
    let raw = if tx.hex.is_empty() {
        serialize(&to_transaction(tx)?)
    } else {
        Vec::<u8>::from_hex(&tx.hex)
            .map_err(|e| CoreError::MalformedPayload(format!("invalid transaction hex: {e}")))?
    };

    let mut packed = Vec::with_capacity(PACKED_HEIGHT_LEN + raw.len());
    packed.extend_from_slice(&height.0.to_le_bytes());
    packed.extend_from_slice(&raw);
    Ok(packed)
}

pub(super) fn unpack_tx(codec: &TxCodec, packed: &[u8]) -> Result<(Tx, BlockHeight), CoreError> {
    if packed.len() < PACKED_HEIGHT_LEN {
        return Err(CoreError::CorruptPackedData(format!(
            "{} bytes is shorter than the height field",
            packed.len()
        )));
    }
    let (height_bytes, raw) = packed.split_at(PACKED_HEIGHT_LEN);
    let mut height = [0u8; PACKED_HEIGHT_LEN];
    height.copy_from_slice(height_bytes);

    // `deserialize` also rejects trailing bytes, so any length that disagrees
    // with the encoded input/output counts fails here.
    let tx: Transaction =
        deserialize(raw).map_err(|e| CoreError::CorruptPackedData(e.to_string()))?;

    let record = codec.tx_from_transaction(&tx, raw, tx.is_coinbase());
    Ok((record, BlockHeight(u32::from_le_bytes(height))))
}

pub(super) fn parse_block(codec: &TxCodec, raw: &[u8]) -> Result<ParsedBlock, CoreError> {
    let mut cursor = Cursor::new(raw);
    let header = block::Header::consensus_decode(&mut cursor)
        .map_err(|e| CoreError::MalformedBlock(format!("header: {e}")))?;
    let txdata = Vec::<Transaction>::consensus_decode(&mut cursor)
        .map_err(|e| CoreError::MalformedBlock(format!("transactions: {e}")))?;
    // Proof-of-stake blocks carry a block signature after the transactions.
    let trailing = raw.len() as u64 - cursor.position();
    if trailing > 0 {
        tracing::trace!(trailing, "ignoring bytes after block transactions");
    }

    let txs = txdata
        .iter()
        .enumerate()
        .map(|(index, tx)| codec.tx_from_transaction(tx, &serialize(tx), index == 0))
        .collect();

    Ok(ParsedBlock {
        hash: header.block_hash(),
        prev_hash: header.prev_blockhash,
        size: raw.len() as u64,
        time: i64::from(header.time),
        txs,
    })
}

/// Rebuild the consensus transaction from a record's structured fields.
fn to_transaction(tx: &Tx) -> Result<Transaction, CoreError> {
    let input = tx
        .inputs
        .iter()
        .map(|input| {
            let (previous_output, script_sig) = match &input.coinbase {
                Some(coinbase) => (
                    OutPoint::null(),
                    ScriptBuf::from_hex(coinbase).map_err(|e| {
                        CoreError::MalformedPayload(format!("invalid coinbase hex: {e}"))
                    })?,
                ),
                None => (
                    input.prevout.ok_or_else(|| {
                        CoreError::MalformedPayload("non-coinbase input without prevout".into())
                    })?,
                    input.script_sig.clone(),
                ),
            };
            Ok(TxIn {
                previous_output,
                script_sig,
                sequence: Sequence(input.sequence),
                witness: Witness::default(),
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    let output = tx
        .outputs
        .iter()
        .map(|output| TxOut {
            value: output.value,
            script_pubkey: output.script_pub_key.clone(),
        })
        .collect();

    Ok(Transaction {
        version: transaction::Version(tx.version),
        lock_time: absolute::LockTime::from_consensus(tx.locktime),
        input,
        output,
    })
}

pub(super) fn raw_hex(raw: &[u8]) -> String {
    raw.to_lower_hex_string()
}
