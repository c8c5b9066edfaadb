//! HTTP front end for apiguard.
//!
//! This crate exposes the authorization engine to the gateway pipeline.
//! It handles:
//!
//! - Building decision inputs from request headers
//! - Authorization checks with reason codes
//! - Read-only views of the routing mirror and service white list
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway pipeline                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     apiguard-gateway                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Request    │ │   Router    │ │    Diagnostics      │   │
//! │  │  Extraction │ │  + Handlers │ │    (admin)          │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │  Auth    │   │ Routing  │   │ Config   │
//!        │  Engine  │   │ Mirror   │   │ Store    │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use apiguard_auth::{AuthConfig, AuthorizationEngine, InMemoryAppRegistry, StaticTopology};
//! use apiguard_control::{AccessIndex, ServiceWhitelist, WatchedValue};
//! use apiguard_gateway::{create_router, GatewayConfig, GatewayState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = Arc::new(AccessIndex::new());
//! let (whitelist_tx, source) = WatchedValue::new("orders".to_string());
//! let (whitelist, _watcher) = ServiceWhitelist::watching(source);
//!
//! let engine = AuthorizationEngine::new(
//!     Arc::clone(&index),
//!     Arc::clone(&whitelist),
//!     Arc::new(InMemoryAppRegistry::new()),
//!     Arc::new(StaticTopology::parse("a")?),
//!     AuthConfig::default(),
//! );
//!
//! let config = GatewayConfig::default();
//! let state = GatewayState::new(Arc::new(engine), index, whitelist, whitelist_tx, config);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod request;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use request::access_request;
pub use routes::create_router;
pub use state::GatewayState;
