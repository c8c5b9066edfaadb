//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use apiguard_auth::AuthorizationEngine;
use apiguard_control::{AccessIndex, ServiceWhitelist};
use tokio::sync::watch;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// This struct holds references to all services needed by the HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The authorization engine.
    pub engine: Arc<AuthorizationEngine>,
    /// The routing-rule mirror, for diagnostics.
    pub index: Arc<AccessIndex>,
    /// The service white list, for diagnostics.
    pub whitelist: Arc<ServiceWhitelist>,
    /// Source of the white list value; sending on it triggers a rebuild.
    pub whitelist_source: Arc<watch::Sender<String>>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl GatewayState {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        engine: Arc<AuthorizationEngine>,
        index: Arc<AccessIndex>,
        whitelist: Arc<ServiceWhitelist>,
        whitelist_source: watch::Sender<String>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            engine,
            index,
            whitelist,
            whitelist_source: Arc::new(whitelist_source),
            config,
        }
    }
}
