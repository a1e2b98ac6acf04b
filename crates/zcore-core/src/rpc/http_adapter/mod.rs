//! Native JSON-RPC client for ZCore daemons.
//!
//! Implements [`DaemonRpc`](super::DaemonRpc) over JSON-RPC 1.0 using
//! `reqwest`, with basic auth, a per-call timeout, optional request rate
//! limiting, and an LRU block-height cache.

mod client;
mod connection;
mod parsing;
mod protocol;

pub use client::HttpRpcClient;
