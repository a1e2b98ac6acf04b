use reqwest::StatusCode;

/// Stable error taxonomy surfaced to the indexing pipeline.
///
/// Daemon-reported failures are translated into these kinds as soon as the
/// response is decoded (see `rpc::map_daemon_error`); nothing is retried at
/// this layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Also returned when a block exists but is not yet deep enough to index.
    #[error("block not found")]
    BlockNotFound,

    #[error("transaction not found")]
    TransactionNotFound,

    #[error("output index missing")]
    OutputIndexMissing,

    #[error("invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unsupported script")]
    UnsupportedScript,

    #[error("malformed daemon payload: {0}")]
    MalformedPayload(String),

    #[error("malformed block: {0}")]
    MalformedBlock(String),

    #[error("corrupt packed transaction: {0}")]
    CorruptPackedData(String),

    #[error("RPC transport failure: {0}")]
    Transport(#[from] RpcError),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Daemon error with no stable mapping; the original text is kept.
    #[error("daemon error (code {code}): {message}")]
    Daemon { code: i64, message: String },
}

/// Failures below the JSON-RPC layer: network, timeout, and body decoding.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),

    #[error("response decoding aborted: {0}")]
    DecodePanic(String),

    #[error("empty response body (HTTP {status})")]
    EmptyResponse { status: StatusCode },
}

impl CoreError {
    /// `true` for the conditions the pipeline should treat as "try again
    /// later" rather than as hard failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BlockNotFound | Self::Transport(_))
    }
}
