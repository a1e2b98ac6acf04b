//! Address descriptor codec.
//!
//! An address descriptor is the locking script an address stands for. The
//! codec converts Base58Check addresses into descriptors under the active
//! network's version bytes and back again for the script forms it knows.

use bitcoin::hashes::Hash;
use bitcoin::hex::DisplayHex;
use bitcoin::script::Instruction;
use bitcoin::{base58, PubkeyHash, PublicKey, Script, ScriptBuf, ScriptHash};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::params::NetworkParams;
use crate::types::ScriptType;

/// Version byte plus 20-byte hash.
const BASE58_PAYLOAD_LEN: usize = 21;

// ==============================================================================
// Address Descriptor
// ==============================================================================

/// Opaque key identifying an output's locking condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressDescriptor(ScriptBuf);

impl AddressDescriptor {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ScriptBuf::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_script(&self) -> &Script {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl From<ScriptBuf> for AddressDescriptor {
    fn from(script: ScriptBuf) -> Self {
        Self(script)
    }
}

impl std::fmt::Display for AddressDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.as_bytes().to_lower_hex_string())
    }
}

// ==============================================================================
// Script Classification
// ==============================================================================

/// Classify a script using the `bitcoin` crate's built-in detection methods.
#[must_use]
pub fn classify_script(script: &Script) -> ScriptType {
    if script.is_p2pkh() {
        ScriptType::P2pkh
    } else if script.is_p2sh() {
        ScriptType::P2sh
    } else if script.is_p2pk() {
        ScriptType::P2pk
    } else if script.is_multisig() {
        ScriptType::BareMultisig
    } else if script.is_op_return() {
        ScriptType::OpReturn
    } else {
        ScriptType::Unknown
    }
}

// ==============================================================================
// Codec
// ==============================================================================

/// Address codec bound to one network's version bytes.
#[derive(Debug, Clone, Copy)]
pub struct AddressCodec {
    params: &'static NetworkParams,
}

impl AddressCodec {
    pub fn new(params: &'static NetworkParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &'static NetworkParams {
        self.params
    }

    /// Decode a Base58Check address into its locking script.
    pub fn descriptor_from_address(&self, address: &str) -> Result<AddressDescriptor, CoreError> {
        let invalid = |reason: String| CoreError::InvalidAddress {
            address: address.to_owned(),
            reason,
        };

        let payload = base58::decode_check(address).map_err(|e| invalid(e.to_string()))?;
        if payload.len() != BASE58_PAYLOAD_LEN {
            return Err(invalid(format!(
                "expected {BASE58_PAYLOAD_LEN} byte payload, got {}",
                payload.len()
            )));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        let version = payload[0];

        let script = if version == self.params.pubkey_hash_addr_id {
            ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash))
        } else if version == self.params.script_hash_addr_id {
            ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash))
        } else {
            return Err(invalid(format!(
                "version byte {version} does not belong to network `{}`",
                self.params.name
            )));
        };
        Ok(AddressDescriptor(script))
    }

    /// Resolve the addresses that back a descriptor.
    ///
    /// The flag is `false` when the script does not map to exactly one
    /// address (multisig, data-only outputs).
    pub fn addresses_from_descriptor(
        &self,
        descriptor: &AddressDescriptor,
    ) -> Result<(Vec<String>, bool), CoreError> {
        self.addresses_from_script(descriptor.as_script())
    }

    pub fn addresses_from_script(&self, script: &Script) -> Result<(Vec<String>, bool), CoreError> {
        let bytes = script.as_bytes();
        match classify_script(script) {
            ScriptType::P2pkh => Ok((
                vec![self.encode(self.params.pubkey_hash_addr_id, &bytes[3..23])],
                true,
            )),
            ScriptType::P2sh => Ok((
                vec![self.encode(self.params.script_hash_addr_id, &bytes[2..22])],
                true,
            )),
            ScriptType::P2pk => {
                let keys = pushed_public_keys(script)?;
                let key = keys.first().ok_or(CoreError::UnsupportedScript)?;
                Ok((vec![self.pubkey_address(key)], true))
            }
            ScriptType::BareMultisig => {
                let keys = pushed_public_keys(script)?;
                let addresses = keys.iter().map(|key| self.pubkey_address(key)).collect();
                Ok((addresses, false))
            }
            ScriptType::OpReturn => Ok((Vec::new(), false)),
            ScriptType::Unknown => Err(CoreError::UnsupportedScript),
        }
    }

    fn pubkey_address(&self, key: &PublicKey) -> String {
        self.encode(
            self.params.pubkey_hash_addr_id,
            key.pubkey_hash().as_byte_array(),
        )
    }

    fn encode(&self, version: u8, hash: &[u8]) -> String {
        let mut payload = Vec::with_capacity(BASE58_PAYLOAD_LEN);
        payload.push(version);
        payload.extend_from_slice(hash);
        base58::encode_check(&payload)
    }
}

/// Collect the public keys pushed by a P2PK or bare multisig script.
fn pushed_public_keys(script: &Script) -> Result<Vec<PublicKey>, CoreError> {
    let mut keys = Vec::new();
    for instruction in script.instructions() {
        let instruction = instruction.map_err(|_| CoreError::UnsupportedScript)?;
        if let Instruction::PushBytes(push) = instruction {
            // Skip small-number pushes that encode the multisig threshold.
            if push.len() < 33 {
                continue;
            }
            let key =
                PublicKey::from_slice(push.as_bytes()).map_err(|_| CoreError::UnsupportedScript)?;
            keys.push(key);
        }
    }
    Ok(keys)
}
