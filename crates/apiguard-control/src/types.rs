//! Synchronizer configuration.

use std::time::Duration;

use apiguard_store::{API_CONFIG_CHANNEL, API_CONFIG_KEY};
use serde::Deserialize;

/// Configuration for the routing-rule synchronizer.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Hash holding the full rule set.
    #[serde(default = "SyncConfig::default_config_key")]
    pub config_key: String,

    /// Channel carrying rule changes.
    #[serde(default = "SyncConfig::default_change_channel")]
    pub change_channel: String,

    /// How long to wait for the change channel to acknowledge the subscription.
    #[serde(default = "SyncConfig::default_subscribe_timeout")]
    pub subscribe_timeout_seconds: u64,
}

impl SyncConfig {
    fn default_config_key() -> String {
        API_CONFIG_KEY.to_string()
    }

    fn default_change_channel() -> String {
        API_CONFIG_CHANNEL.to_string()
    }

    const fn default_subscribe_timeout() -> u64 {
        30
    }

    /// Get the subscription timeout as a `Duration`.
    #[must_use]
    pub fn subscribe_timeout(&self) -> Duration {
        Duration::from_secs(self.subscribe_timeout_seconds)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            config_key: Self::default_config_key(),
            change_channel: Self::default_change_channel(),
            subscribe_timeout_seconds: Self::default_subscribe_timeout(),
        }
    }
}
