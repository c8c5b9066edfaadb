//! Routing-rule mirror for apiguard.
//!
//! This crate keeps an in-process copy of the control plane's routing rules
//! and the service whitelist, both read by every in-flight request.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  snapshot + changes  ┌──────────────────────┐
//! │   ConfigStore    │─────────────────────▶│  ConfigSynchronizer  │
//! │  (hash, pub/sub) │                      │  (single writer)     │
//! └──────────────────┘                      └──────────┬───────────┘
//!                                                      │ apply
//!                                           ┌──────────▼───────────┐
//!                                           │     AccessIndex      │
//!                                           │  app → group →       │
//!                                           │  service → rule      │
//!                                           └──────────┬───────────┘
//!                                                      │ lock-free snapshots
//! ┌──────────────────┐                      ┌──────────▼───────────┐
//! │  WatchedValue    │─────────────────────▶│  Authorization       │
//! │  (whitelist src) │   ServiceWhitelist   │  (apiguard-auth)     │
//! └──────────────────┘                      └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use apiguard_control::{AccessIndex, ConfigSynchronizer};
//! use apiguard_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let index = Arc::new(AccessIndex::new());
//!
//! let sync = Arc::new(ConfigSynchronizer::with_defaults(store, Arc::clone(&index)));
//! let _consumer = sync.initialize().await?;
//!
//! let rule = index.lookup("partnerX", "orders", "GET", "/orders");
//! println!("matched: {rule:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod index;
pub mod sync;
pub mod types;
pub mod whitelist;

pub use error::{ControlError, Result};
pub use index::{AccessIndex, Applied, GatewayGroup, RoutingTable, ServiceConfig};
pub use sync::ConfigSynchronizer;
pub use types::SyncConfig;
pub use whitelist::{ServiceWhitelist, WatchedValue};

// Re-export commonly used types from dependencies for convenience
pub use apiguard_core::{ApiConfig, ApiId, GroupId, RuleAccess};
