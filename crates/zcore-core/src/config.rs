//! Backend configuration, as handed over by the external loader.
//!
//! Field names follow the loader's JSON keys. Everything except `rpc_url`
//! has a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_RPC_TIMEOUT_SECS: u64 = 25;
const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 100;
const DEFAULT_BLOCK_FETCH_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_user: Option<String>,
    #[serde(default)]
    pub rpc_pass: Option<String>,
    /// `user:password` cookie written by the daemon; used when no explicit
    /// credentials are configured.
    #[serde(default)]
    pub rpc_cookie_file: Option<PathBuf>,
    /// Per-call timeout in seconds.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout: u64,
    /// ZCore daemons do not implement `estimatesmartfee`.
    #[serde(default = "default_disable_smart_fee")]
    pub disable_estimate_smart_fee: bool,
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,
    #[serde(default)]
    pub rpc_requests_per_second: Option<u32>,
    /// Maximum in-flight transaction fetches while assembling one block.
    #[serde(default = "default_block_fetch_concurrency")]
    pub block_fetch_concurrency: usize,
}

fn default_rpc_timeout() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

fn default_disable_smart_fee() -> bool {
    true
}

fn default_max_idle_connections() -> usize {
    DEFAULT_MAX_IDLE_CONNECTIONS
}

fn default_block_fetch_concurrency() -> usize {
    DEFAULT_BLOCK_FETCH_CONCURRENCY
}

impl BackendConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            rpc_user: None,
            rpc_pass: None,
            rpc_cookie_file: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT_SECS,
            disable_estimate_smart_fee: true,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            rpc_requests_per_second: None,
            block_fetch_concurrency: DEFAULT_BLOCK_FETCH_CONCURRENCY,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.rpc_user = Some(user.into());
        self.rpc_pass = Some(pass.into());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Configuration(format!("invalid backend config: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout)
    }

    /// Check the numeric settings. Connection and credential checks happen
    /// when the RPC client is built.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.rpc_timeout == 0 {
            return Err(CoreError::Configuration(
                "rpc_timeout must be at least 1 second".to_owned(),
            ));
        }
        if self.max_idle_connections == 0 {
            return Err(CoreError::Configuration(
                "max_idle_connections must be at least 1".to_owned(),
            ));
        }
        if self.block_fetch_concurrency == 0 {
            return Err(CoreError::Configuration(
                "block_fetch_concurrency must be at least 1".to_owned(),
            ));
        }
        if self.rpc_requests_per_second == Some(0) {
            return Err(CoreError::Configuration(
                "rpc_requests_per_second must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
