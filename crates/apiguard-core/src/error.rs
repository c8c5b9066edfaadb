//! Common error types for apiguard.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while decoding core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A routing rule payload could not be decoded.
    #[error("invalid routing rule {raw:?}: {source}")]
    Decode {
        /// The raw payload that failed to decode.
        raw: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A gateway group id was not exactly one character.
    #[error("invalid gateway group id: {0:?}")]
    InvalidGroupId(String),
}
