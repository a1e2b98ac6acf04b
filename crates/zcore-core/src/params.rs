//! Per-network constants and the process-wide parameter registry.
//!
//! The daemon reports its chain as `main`, `test` or `regtest`; anything else
//! falls back to main-network parameters. The three parameter sets are
//! registered once per process, and name lookups resolve through that
//! registry.

use std::sync::{Mutex, OnceLock, PoisonError};

use serde::Serialize;
use tracing::debug;

// ==============================================================================
// Network Parameters
// ==============================================================================

/// Immutable constants identifying one ZCore network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkParams {
    pub name: &'static str,
    /// Four-byte network identifier used on the P2P wire.
    pub magic: u32,
    /// Base58 version byte of pay-to-pubkey-hash addresses.
    pub pubkey_hash_addr_id: u8,
    /// Base58 version byte of pay-to-script-hash addresses.
    pub script_hash_addr_id: u8,
}

pub const MAINNET: NetworkParams = NetworkParams {
    name: "main",
    magic: 0xcc64_5c66,
    pubkey_hash_addr_id: 142,
    script_hash_addr_id: 0,
};

/// Testnet addresses start with `y` (P2PKH) and `8`/`9` (P2SH).
pub const TESTNET: NetworkParams = NetworkParams {
    name: "test",
    magic: 0xcb61_8550,
    pubkey_hash_addr_id: 139,
    script_hash_addr_id: 19,
};

pub const REGTEST: NetworkParams = NetworkParams {
    name: "regtest",
    magic: 0x3145_27a9,
    pubkey_hash_addr_id: 139,
    script_hash_addr_id: 19,
};

impl NetworkParams {
    pub fn is_mainnet(&self) -> bool {
        self.magic == MAINNET.magic
    }

    /// Network label expected by the indexing pipeline's `getinfo`-style
    /// consumers.
    pub fn network_label(&self) -> &'static str {
        if self.is_mainnet() {
            "livenet"
        } else {
            "testnet"
        }
    }
}

// ==============================================================================
// Registry
// ==============================================================================

/// Registry of known parameter sets, keyed by network magic.
///
/// Registering a set whose magic is already present is a no-op, so racing
/// initializers are harmless.
#[derive(Debug, Default)]
pub struct ChainRegistry {
    registered: Mutex<Vec<&'static NetworkParams>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, populated with the three ZCore networks on
    /// first access.
    pub fn global() -> &'static ChainRegistry {
        static GLOBAL: OnceLock<ChainRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = ChainRegistry::new();
            for params in [&MAINNET, &TESTNET, &REGTEST] {
                registry.register(params);
            }
            debug!("registered zcore chain parameters");
            registry
        })
    }

    /// Register `params`. Returns `false` if its magic was already known.
    pub fn register(&self, params: &'static NetworkParams) -> bool {
        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if registered.iter().any(|p| p.magic == params.magic) {
            return false;
        }
        registered.push(params);
        true
    }

    pub fn is_registered(&self, magic: u32) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p.magic == magic)
    }

    /// The registered parameter set whose name is `chain`.
    pub fn lookup(&self, chain: &str) -> Option<&'static NetworkParams> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name == chain)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Look up the parameters for the chain name reported by `getblockchaininfo`.
pub fn params_for(chain: &str) -> &'static NetworkParams {
    ChainRegistry::global().lookup(chain).unwrap_or(&MAINNET)
}
