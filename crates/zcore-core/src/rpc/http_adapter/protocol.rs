use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{CoreError, RpcError};
use crate::rpc::error_map::map_daemon_error;

/// Upper bound on response bytes echoed into logs and error messages.
pub(super) const MAX_LOGGED_BODY: usize = 512;

/// JSON-RPC 1.0 request, as the daemon expects it.
#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: u64,
    pub(super) method: &'a str,
    pub(super) params: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    pub(super) result: Option<serde_json::Value>,
    pub(super) error: Option<serde_json::Value>,
}

/// Parse a JSON-RPC error value and map it through the daemon error table.
///
/// Errors shaped `{"code": <int>, "message": <string>}` are mapped; anything
/// else becomes an `InvalidResponse` with the raw JSON.
pub(super) fn parse_jsonrpc_error(err: serde_json::Value) -> CoreError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    match serde_json::from_value::<JsonRpcError>(err.clone()) {
        Ok(parsed) => map_daemon_error(parsed.code, &parsed.message),
        Err(_) => RpcError::InvalidResponse(format!(
            "non-standard JSON-RPC error: {}",
            truncate_for_log(&err.to_string())
        ))
        .into(),
    }
}

/// Deserialize a response body, turning both decode errors and panics inside
/// the decoder into `RpcError`s.
pub(super) fn decode_guarded<T: DeserializeOwned>(body: &str) -> Result<T, RpcError> {
    match panic::catch_unwind(AssertUnwindSafe(|| serde_json::from_str::<T>(body))) {
        Ok(Ok(decoded)) => Ok(decoded),
        Ok(Err(e)) => Err(RpcError::InvalidResponse(format!(
            "decode JSON-RPC response: {e}; body={}",
            truncate_for_log(body)
        ))),
        Err(_) => {
            warn!(
                body_len = body.len(),
                body = %truncate_for_log(body),
                "recovered from panic while decoding rpc response"
            );
            Err(RpcError::DecodePanic(format!(
                "body={}",
                truncate_for_log(body)
            )))
        }
    }
}

/// Cut `body` to at most `MAX_LOGGED_BODY` bytes on a char boundary.
pub(super) fn truncate_for_log(body: &str) -> &str {
    if body.len() <= MAX_LOGGED_BODY {
        return body;
    }
    let mut end = MAX_LOGGED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
