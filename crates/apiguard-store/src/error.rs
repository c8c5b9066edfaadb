//! Error types for the control-plane store.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the control-plane store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Connection(String),

    /// The subscription channel was closed by the store.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// The store reported an error.
    #[error("store error: {0}")]
    Backend(String),
}
