//! Transaction codec.
//!
//! Converts between the daemon's verbose JSON, the canonical [`Tx`] record,
//! and the packed binary form used for storage. A [`TxCodec`] is built from
//! the active network parameters; address resolution is delegated to an
//! [`AddressCodec`] for the same network.

mod json;
mod packed;

pub use json::{amount_from_coins, COIN};
pub use packed::PACKED_HEIGHT_LEN;

pub(crate) use json::{parse_coin_amount, parse_integer_optional};

use bitcoin::hex::DisplayHex;
use bitcoin::Transaction;

use crate::address::AddressCodec;
use crate::error::CoreError;
use crate::params::NetworkParams;
use crate::types::{BlockHeight, ParsedBlock, Tx, TxInput, TxOutput};

#[derive(Debug, Clone, Copy)]
pub struct TxCodec {
    addresses: AddressCodec,
}

impl TxCodec {
    pub fn new(params: &'static NetworkParams) -> Self {
        Self {
            addresses: AddressCodec::new(params),
        }
    }

    pub fn address_codec(&self) -> &AddressCodec {
        &self.addresses
    }

    pub fn params(&self) -> &'static NetworkParams {
        self.addresses.params()
    }

    /// Map a verbose daemon transaction to the canonical record.
    pub fn tx_from_json(&self, raw: &serde_json::Value) -> Result<Tx, CoreError> {
        json::tx_from_json(raw)
    }

    /// Pack `tx` with the height it was confirmed at.
    pub fn pack_tx(&self, tx: &Tx, height: BlockHeight) -> Result<Vec<u8>, CoreError> {
        packed::pack_tx(tx, height)
    }

    /// Inverse of [`TxCodec::pack_tx`]. Confirmations and timestamps are not
    /// stored and come back as zero.
    pub fn unpack_tx(&self, packed: &[u8]) -> Result<(Tx, BlockHeight), CoreError> {
        packed::unpack_tx(self, packed)
    }

    /// Decode a raw block as returned by `getblock <hash> 0`.
    pub fn parse_block(&self, raw: &[u8]) -> Result<ParsedBlock, CoreError> {
        packed::parse_block(self, raw)
    }

    /// Build a record from a decoded consensus transaction.
    ///
    /// With `coinbase` set, the first input is reported as a coinbase input.
    /// Outputs whose script the address codec does not recognise get an
    /// empty address list.
    pub fn tx_from_transaction(&self, tx: &Transaction, raw: &[u8], coinbase: bool) -> Tx {
        let inputs = tx
            .input
            .iter()
            .enumerate()
            .map(|(index, input)| {
                if coinbase && index == 0 {
                    TxInput {
                        coinbase: Some(input.script_sig.as_bytes().to_lower_hex_string()),
                        prevout: None,
                        script_sig: bitcoin::ScriptBuf::new(),
                        sequence: input.sequence.0,
                    }
                } else {
                    TxInput {
                        coinbase: None,
                        prevout: Some(input.previous_output),
                        script_sig: input.script_sig.clone(),
                        sequence: input.sequence.0,
                    }
                }
            })
            .collect();

        let outputs = tx
            .output
            .iter()
            .enumerate()
            .map(|(n, output)| TxOutput {
                value: output.value,
                n: n as u32,
                script_pub_key: output.script_pubkey.clone(),
                addresses: self
                    .addresses
                    .addresses_from_script(&output.script_pubkey)
                    .map(|(addresses, _)| addresses)
                    .unwrap_or_default(),
            })
            .collect();

        Tx {
            hex: packed::raw_hex(raw),
            txid: tx.compute_txid(),
            version: tx.version.0,
            locktime: tx.lock_time.to_consensus_u32(),
            inputs,
            outputs,
            confirmations: 0,
            time: 0,
            block_time: 0,
        }
    }
}
