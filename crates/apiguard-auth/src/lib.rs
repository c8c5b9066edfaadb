//! Per-request authorization for apiguard.
//!
//! This crate decides whether a calling application may invoke a backend API:
//!
//! - Gateway group ownership checks
//! - Per-app origin IP white lists
//! - MD5 signature or pluggable custom authentication
//! - Service white list and per-app routing rules
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐
//! │   Gateway        │────▶│  AuthorizationEngine │
//! │   (HTTP)         │     │  can_access()        │
//! └──────────────────┘     └──┬───────┬───────┬───┘
//!                             │       │       │
//!               ┌─────────────▼┐ ┌────▼─────┐ ┌▼──────────────┐
//!               │ AccessIndex  │ │ AppReg-  │ │ CustomAuth    │
//!               │ + Whitelist  │ │ istry    │ │ (trait)       │
//!               └──────────────┘ └──────────┘ └───────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use apiguard_auth::{
//!     AccessRequest, AuthConfig, AuthorizationEngine, InMemoryAppRegistry, StaticTopology,
//! };
//! use apiguard_control::{AccessIndex, ServiceWhitelist};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = AuthorizationEngine::new(
//!     Arc::new(AccessIndex::new()),
//!     Arc::new(ServiceWhitelist::new("orders")),
//!     Arc::new(InMemoryAppRegistry::new()),
//!     Arc::new(StaticTopology::parse("a")?),
//!     AuthConfig::default(),
//! );
//!
//! let request = AccessRequest::new("partnerX", "10.0.0.1", "orders", "GET", "/orders");
//! let decision = engine.can_access(&request).await;
//! println!("allowed: {}", decision.is_allowed());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod access;
pub mod custom;
pub mod engine;
pub mod error;
pub mod registry;
pub mod sign;
pub mod topology;

use std::time::Duration;

use serde::Deserialize;

pub use access::{Access, Decision};
pub use custom::CustomAuth;
pub use engine::{AccessRequest, AuthorizationEngine};
pub use error::{AuthError, Result};
pub use registry::{AppRegistry, InMemoryAppRegistry};
pub use topology::{StaticTopology, TopologyProvider};

#[cfg(any(test, feature = "test-utils"))]
pub use custom::MockCustomAuth;

/// Configuration for the authorization engine.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Apps exempt from the group, service and rule existence checks.
    #[serde(default = "AuthConfig::default_privileged_apps")]
    pub privileged_apps: Vec<String>,
    /// Upper bound on one custom authentication call, in milliseconds.
    #[serde(default = "AuthConfig::default_custom_auth_timeout_ms")]
    pub custom_auth_timeout_ms: u64,
}

impl AuthConfig {
    fn default_privileged_apps() -> Vec<String> {
        vec!["toC".to_string(), "toB".to_string()]
    }

    const fn default_custom_auth_timeout_ms() -> u64 {
        5000
    }

    /// Returns `true` if `app` is privileged.
    #[must_use]
    pub fn is_privileged(&self, app: &str) -> bool {
        self.privileged_apps.iter().any(|p| p == app)
    }

    /// Get the custom authentication timeout as a Duration.
    #[must_use]
    pub const fn custom_auth_timeout(&self) -> Duration {
        Duration::from_millis(self.custom_auth_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            privileged_apps: Self::default_privileged_apps(),
            custom_auth_timeout_ms: Self::default_custom_auth_timeout_ms(),
        }
    }
}
