//! Control-plane store access for apiguard.
//!
//! Routing rules live in a shared key-value store that every gateway instance
//! reads. The full rule set is a hash (field per rule id), and changes are
//! published on a pub/sub channel using the same JSON encoding.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  read_hash   ┌──────────────────┐
//! │ ConfigSynchronizer│────────────▶│   ConfigStore    │
//! │ (apiguard-control)│◀────────────│   (trait)        │
//! └──────────────────┘  subscribe   └────────┬─────────┘
//!                                            │
//!                                   ┌────────▼─────────┐
//!                                   │   MemoryStore    │
//!                                   │   (in-process)   │
//!                                   └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use apiguard_store::{ConfigStore, MemoryStore};
//! use futures::StreamExt;
//!
//! # async fn example() -> apiguard_store::Result<()> {
//! let store = MemoryStore::new();
//! store.put_field("rules", "1", "{}");
//!
//! let snapshot = store.read_hash("rules").await?;
//! assert_eq!(snapshot.len(), 1);
//!
//! let mut changes = store.subscribe("rules_channel").await?;
//! store.publish("rules_channel", "{}");
//! assert_eq!(changes.next().await.transpose()?, Some("{}".to_string()));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;

pub use error::{Result, StoreError};
pub use keys::{API_CONFIG_CHANNEL, API_CONFIG_KEY};
pub use memory::{Fault, MemoryStore};

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// An ordered stream of messages from a pub/sub channel.
///
/// Messages arrive in publication order. An `Err` item reports a transport
/// problem; the stream ends when the store closes the channel.
pub type Subscription = BoxStream<'static, Result<String>>;

/// The operations the gateway needs from the control-plane store.
///
/// This trait abstracts the store, allowing for different implementations
/// (e.g., a networked store in production, in-memory for testing).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read every field of a hash.
    ///
    /// A missing key yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Subscribe to a channel.
    ///
    /// The returned future resolves only once the store has acknowledged the
    /// subscription; no message published afterwards is missed.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription is refused.
    async fn subscribe(&self, channel: &str) -> Result<Subscription>;
}
