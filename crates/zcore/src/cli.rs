use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Inspect a ZCore daemon through the indexing backend.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(flatten)]
    pub rpc: RpcArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct RpcArgs {
    /// JSON backend config file. When given, the RPC flags below are ignored.
    #[arg(long, global = true, env = "ZCORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// ZCore daemon RPC URL.
    #[arg(
        long,
        global = true,
        default_value = "http://127.0.0.1:17293",
        env = "ZCORE_RPC_URL"
    )]
    pub rpc_url: String,

    /// RPC username.
    #[arg(long, global = true, env = "ZCORE_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password.
    #[arg(long, global = true, env = "ZCORE_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Cookie file holding `user:password`, used when no user/pass is given.
    #[arg(long, global = true, env = "ZCORE_RPC_COOKIE_FILE")]
    pub rpc_cookie_file: Option<PathBuf>,

    /// Per-call RPC timeout in seconds.
    #[arg(long, global = true, default_value = "25", env = "ZCORE_RPC_TIMEOUT")]
    pub rpc_timeout: u64,

    /// Maximum concurrent transaction fetches per block.
    #[arg(long, global = true, default_value = "16")]
    pub block_fetch_concurrency: usize,

    /// Client-side limit on RPC calls per second.
    #[arg(long, global = true, env = "ZCORE_RPC_REQUESTS_PER_SECOND")]
    pub rpc_requests_per_second: Option<u32>,

    /// Use plain `estimatefee` instead of `estimatesmartfee`. Pass `false`
    /// only if the daemon implements smart estimation.
    #[arg(
        long,
        global = true,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "ZCORE_DISABLE_ESTIMATE_SMART_FEE"
    )]
    pub disable_estimate_smart_fee: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Chain status merged from `getblockchaininfo` and `getinfo`.
    Info,

    /// Fetch a confirmation-safe block with all of its transactions.
    Block {
        #[arg(long)]
        hash: Option<String>,
        /// Required; also used to look up the hash when `--hash` is omitted.
        #[arg(long)]
        height: u32,
    },

    /// Fetch one transaction by id.
    Tx { txid: String },

    /// Fetch a transaction and print its packed form as hex.
    Pack {
        txid: String,
        #[arg(long)]
        height: u32,
    },

    /// Decode a packed transaction given as hex. Does not contact the daemon.
    Unpack {
        hex: String,
        /// Network whose address version bytes are used.
        #[arg(long, default_value = "main")]
        chain: String,
    },

    /// Convert an address to its descriptor. Does not contact the daemon.
    Address {
        address: String,
        #[arg(long, default_value = "main")]
        chain: String,
    },

    /// Resolve a hex descriptor to addresses. Does not contact the daemon.
    Descriptor {
        hex: String,
        #[arg(long, default_value = "main")]
        chain: String,
    },

    /// Broadcast a raw transaction.
    Send { hex: String },

    /// Fetch a block's raw bytes and decode them locally.
    ParseBlock { hash: String },

    /// Fee rate estimate per kB.
    Fee {
        #[arg(long, default_value = "2")]
        blocks: u16,
    },
}
