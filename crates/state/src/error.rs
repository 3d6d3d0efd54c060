use std::io;

use thiserror::Error;

/// Errors raised while reading or writing persisted state.
/// 讀寫持久化狀態時可能出現的錯誤。
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state store IO error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupted state payload: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode state payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed key-value entry: {0}")]
    MalformedEntry(String),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}
