pub mod address;
pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod params;
pub mod rpc;
pub mod safe_height;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

pub use address::{AddressCodec, AddressDescriptor};
pub use backend::ZcoreBackend;
pub use codec::TxCodec;
pub use config::BackendConfig;
pub use error::{CoreError, RpcError};
pub use params::{params_for, NetworkParams};
pub use types::{Block, BlockHeight, ParsedBlock, Tx};
