//! Error types for the adaptive cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced to callers of the cache API.
///
/// Degraded paths (compression, persistence, corrupt payloads) are logged and
/// absorbed by the store; only caller mistakes reach this type.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key failed validation
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed console command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Durable store could not be opened
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// == Storage Error Enum ==
/// Failures reported by a durable store backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend refused the write because it is full
    #[error("Quota exceeded: {needed} bytes requested, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Codec Error Enum ==
/// Failures reported by a compression codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload could not be compressed
    #[error("Compression failed: {0}")]
    Compress(String),

    /// Payload could not be restored; the stored bytes are corrupt
    #[error("Corrupt payload: {0}")]
    Corruption(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
