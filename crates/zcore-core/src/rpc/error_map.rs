//! Translation of daemon error payloads into the stable error taxonomy.
//!
//! The daemon's error codes are reused across unrelated failures, so the
//! mapping keys on the message text instead.

use crate::error::CoreError;

#[derive(Clone, Copy)]
enum Kind {
    BlockNotFound,
    TransactionNotFound,
    OutputIndexMissing,
}

/// Message fragments (lower case) and the error kind they map to.
const MESSAGE_TABLE: &[(&str, Kind)] = &[
    ("block not found", Kind::BlockNotFound),
    ("block height out of range", Kind::BlockNotFound),
    ("best block hash not available", Kind::BlockNotFound),
    (
        "no information available about transaction",
        Kind::TransactionNotFound,
    ),
    (
        "no such mempool or blockchain transaction",
        Kind::TransactionNotFound,
    ),
    ("invalid output index", Kind::OutputIndexMissing),
];

/// Map a daemon error to a stable kind. Unmatched messages become
/// [`CoreError::Daemon`] with the original text.
pub fn map_daemon_error(code: i64, message: &str) -> CoreError {
    let lowered = message.to_ascii_lowercase();
    match MESSAGE_TABLE
        .iter()
        .find(|(marker, _)| lowered.contains(*marker))
    {
        Some((_, Kind::BlockNotFound)) => CoreError::BlockNotFound,
        Some((_, Kind::TransactionNotFound)) => CoreError::TransactionNotFound,
        Some((_, Kind::OutputIndexMissing)) => CoreError::OutputIndexMissing,
        None => CoreError::Daemon {
            code,
            message: message.to_owned(),
        },
    }
}
