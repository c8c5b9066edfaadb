//! Error types for routing-rule synchronization.
//!
//! Every error here is raised during startup. Once the mirror is serving,
//! problems on the change feed are logged and skipped instead.

use std::time::Duration;

use apiguard_core::CoreError;
use apiguard_store::StoreError;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur while building the routing mirror.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A snapshot field held a rule that could not be decoded.
    #[error("snapshot field {field} is not a valid routing rule: {source}")]
    SnapshotDecode {
        /// The hash field holding the bad value.
        field: String,
        /// The decode failure.
        #[source]
        source: CoreError,
    },

    /// The change channel did not acknowledge the subscription in time.
    #[error("change channel subscription not acknowledged within {0:?}")]
    SubscribeTimeout(Duration),

    /// The control-plane store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ControlError {
    /// Returns `true` if the gateway must not start serving after this error.
    ///
    /// All startup errors are fatal; the method exists so callers can match
    /// on intent rather than on variants.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::SnapshotDecode { .. } | Self::SubscribeTimeout(_) | Self::Store(_) => true,
        }
    }
}
