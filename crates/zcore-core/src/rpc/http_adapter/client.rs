use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{Amount, BlockHash, Txid};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use lru::LruCache;
use reqwest::{header, Url};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::config::BackendConfig;
use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeader, BlockHeight, BlockInfo};

use super::super::types::{BlockchainInfo, DaemonInfo};
use super::super::DaemonRpc;
use super::connection::{resolve_auth, rpc_endpoint, Credentials};
use super::parsing::{
    from_result, parse_block_header, parse_block_info, parse_fee_rate, parse_hash_result,
    parse_raw_block, parse_smart_fee,
};
use super::protocol::{
    decode_guarded, parse_jsonrpc_error, truncate_for_log, JsonRpcRequest, JsonRpcResponse,
};

/// Maximum number of block-hash → height entries cached in memory.
const BLOCK_HEIGHT_CACHE_CAP: usize = 10_000;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// ZCore daemon JSON-RPC client over HTTP(S).
///
/// Every call is a single POST with basic auth and the configured timeout.
/// Non-2xx responses are still decoded, since the daemon puts its error
/// object in the body of 404/500 responses.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: Url,
    auth: Option<Credentials>,
    limiter: Option<DirectRateLimiter>,
    next_id: AtomicU64,
    /// Bounded LRU cache mapping block hashes to their height. A hash always
    /// names the same block, so entries never need invalidation, only
    /// eviction under memory pressure.
    block_height_cache: RwLock<LruCache<BlockHash, BlockHeight>>,
}

impl HttpRpcClient {
    /// Create a client from the backend configuration.
    ///
    /// Authentication precedence:
    /// 1. explicit `rpc_user` + `rpc_pass`
    /// 2. cookie file (`username:password`) from `rpc_cookie_file`
    /// 3. no auth
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let auth = resolve_auth(config)?;
        let url = rpc_endpoint(&config.rpc_url)?;

        // Block indexing fetches many transactions per block concurrently,
        // so the idle pool is sized well above the default.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_idle_connections)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::Configuration(format!("build http client: {e}")))?;

        let limiter = match config.rpc_requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Configuration(
                        "rpc_requests_per_second must be at least 1".to_owned(),
                    )
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        let cache_cap = NonZeroUsize::new(BLOCK_HEIGHT_CACHE_CAP)
            .ok_or_else(|| CoreError::Configuration("block height cache is empty".to_owned()))?;

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            next_id: AtomicU64::new(initial_request_id()),
            block_height_cache: RwLock::new(LruCache::new(cache_cap)),
        })
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Perform one JSON-RPC call and return its `result`.
    ///
    /// Daemon error objects are mapped through the daemon error table;
    /// transport and decoding failures surface as [`CoreError::Transport`].
    pub async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        self.wait_for_rate_limit().await;
        let id = self.next_request_id();
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: "1.0",
            id,
            method,
            params,
        };

        let mut builder = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some(credentials) = &self.auth {
            builder = builder.basic_auth(&credentials.user, Some(&credentials.pass));
        }

        let response = builder.send().await.map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %truncate_for_log(&body), "rpc response body");

        if body.trim().is_empty() {
            return Err(RpcError::EmptyResponse { status }.into());
        }

        let decoded: JsonRpcResponse = decode_guarded(&body)?;

        if let Some(err) = decoded.error {
            return Err(parse_jsonrpc_error(err));
        }
        if !status.is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "HTTP {status} without an error object; body={}",
                truncate_for_log(&body)
            ))
            .into());
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl DaemonRpc for HttpRpcClient {
    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, CoreError> {
        let raw = self.call("getblockchaininfo", Vec::new()).await?;
        from_result(raw, "getblockchaininfo")
    }

    async fn get_info(&self) -> Result<DaemonInfo, CoreError> {
        let raw = self.call("getinfo", Vec::new()).await?;
        from_result(raw, "getinfo")
    }

    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        let raw = self.call("getbestblockhash", Vec::new()).await?;
        parse_hash_result(&raw, "getbestblockhash")
    }

    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        let raw = self
            .call("getblockhash", vec![serde_json::json!(height.0)])
            .await?;
        parse_hash_result(&raw, "getblockhash")
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        let raw = self
            .call(
                "getblockheader",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(true)],
            )
            .await?;
        let header = parse_block_header(raw)?;
        self.block_height_cache
            .write()
            .await
            .put(header.hash, header.height);
        Ok(header)
    }

    async fn get_block_height(&self, hash: &BlockHash) -> Result<BlockHeight, CoreError> {
        // `LruCache::get` updates recency, so even lookups take the write lock.
        if let Some(height) = self.block_height_cache.write().await.get(hash).copied() {
            return Ok(height);
        }
        Ok(self.get_block_header(hash).await?.height)
    }

    async fn get_block_info(&self, hash: &BlockHash) -> Result<BlockInfo, CoreError> {
        let raw = self
            .call(
                "getblock",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(true)],
            )
            .await?;
        parse_block_info(raw)
    }

    async fn get_block_raw(&self, hash: &BlockHash) -> Result<Vec<u8>, CoreError> {
        let raw = self
            .call(
                "getblock",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(false)],
            )
            .await?;
        parse_raw_block(&raw)
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError> {
        self.call(
            "getrawtransaction",
            vec![serde_json::json!(txid.to_string()), serde_json::json!(1)],
        )
        .await
    }

    async fn decode_raw_transaction(&self, hex: &str) -> Result<serde_json::Value, CoreError> {
        self.call("decoderawtransaction", vec![serde_json::json!(hex)])
            .await
    }

    async fn send_raw_transaction(&self, hex: &str) -> Result<Txid, CoreError> {
        let raw = self
            .call("sendrawtransaction", vec![serde_json::json!(hex)])
            .await?;
        parse_hash_result(&raw, "sendrawtransaction")
    }

    async fn estimate_smart_fee(&self, blocks: u16) -> Result<Option<Amount>, CoreError> {
        let raw = self
            .call("estimatesmartfee", vec![serde_json::json!(blocks)])
            .await?;
        parse_smart_fee(&raw)
    }

    async fn estimate_fee(&self, blocks: u16) -> Result<Option<Amount>, CoreError> {
        let raw = self
            .call("estimatefee", vec![serde_json::json!(blocks)])
            .await?;
        parse_fee_rate(&raw)
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}
