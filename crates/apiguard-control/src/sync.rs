//! Routing-rule synchronization.
//!
//! The synchronizer bootstraps the [`AccessIndex`] from the control-plane
//! snapshot, then applies the change channel to it in delivery order for the
//! life of the gateway.

use std::sync::Arc;

use apiguard_core::ApiConfig;
use apiguard_store::{ConfigStore, Subscription};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{ControlError, Result};
use crate::index::{AccessIndex, Applied};
use crate::types::SyncConfig;

/// Keeps an [`AccessIndex`] in step with the control-plane store.
pub struct ConfigSynchronizer<S: ConfigStore> {
    store: Arc<S>,
    index: Arc<AccessIndex>,
    config: SyncConfig,
}

impl<S: ConfigStore + 'static> ConfigSynchronizer<S> {
    /// Create a synchronizer feeding `index` from `store`.
    #[must_use]
    pub fn new(store: Arc<S>, index: Arc<AccessIndex>, config: SyncConfig) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>, index: Arc<AccessIndex>) -> Self {
        Self::new(store, index, SyncConfig::default())
    }

    /// The index being maintained.
    #[must_use]
    pub const fn index(&self) -> &Arc<AccessIndex> {
        &self.index
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Load the snapshot and start following the change channel.
    ///
    /// Returns only once every snapshot rule is applied and the channel has
    /// acknowledged the subscription. The returned task consumes the channel
    /// until the store closes it. Dropping the future before it completes
    /// abandons startup.
    ///
    /// The snapshot is read before subscribing, so a change published between
    /// the two is not seen until that rule changes again. Subscribing first
    /// and buffering until the snapshot is applied would close the gap.
    ///
    /// # Errors
    ///
    /// Every error is fatal; the gateway must not serve traffic:
    /// - `ControlError::Store` if the snapshot cannot be read or the
    ///   subscription is refused.
    /// - `ControlError::SnapshotDecode` if any snapshot field is not a valid
    ///   rule. Nothing is applied in that case.
    /// - `ControlError::SubscribeTimeout` if the subscription is not
    ///   acknowledged within the configured timeout.
    pub async fn initialize(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        self.load_snapshot().await?;
        let subscription = self.subscribe().await?;

        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.consume(subscription).await }))
    }

    /// Decode and apply one raw change message.
    ///
    /// A malformed payload is logged and dropped; the subscription carries on.
    pub fn on_change_event(&self, raw: &str) -> Option<Applied> {
        tracing::debug!(payload = %raw, "Routing change received");
        match ApiConfig::decode(raw) {
            Ok(ac) => Some(self.apply_change(ac)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed routing change");
                None
            }
        }
    }

    /// Apply one rule to the index, last write wins.
    pub fn apply_change(&self, ac: ApiConfig) -> Applied {
        let rule_id = ac.id;
        let app = ac.app.clone();
        let applied = self.index.apply(ac);
        tracing::debug!(rule_id, app = %app, applied = ?applied, "Applied routing change");
        applied
    }

    async fn load_snapshot(&self) -> Result<()> {
        let key = &self.config.config_key;
        let snapshot = self.store.read_hash(key).await?;

        let mut rules = Vec::with_capacity(snapshot.len());
        for (field, value) in snapshot {
            tracing::debug!(field = %field, value = %value, "Snapshot rule");
            let ac = ApiConfig::decode(&value).map_err(|source| {
                tracing::error!(field = %field, error = %source, "Invalid snapshot rule");
                ControlError::SnapshotDecode {
                    field: field.clone(),
                    source,
                }
            })?;
            rules.push(ac);
        }

        let count = rules.len();
        self.index.apply_all(rules);

        let table = self.index.snapshot();
        tracing::info!(
            key = %key,
            fields = count,
            rules = table.len(),
            apps = table.group_count(),
            "Loaded routing snapshot"
        );
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription> {
        let channel = &self.config.change_channel;
        let timeout = self.config.subscribe_timeout();

        let subscription = tokio::time::timeout(timeout, self.store.subscribe(channel))
            .await
            .map_err(|_| {
                tracing::error!(channel = %channel, ?timeout, "Subscription not acknowledged");
                ControlError::SubscribeTimeout(timeout)
            })?
            .inspect_err(|e| {
                tracing::error!(channel = %channel, error = %e, "Subscription failed");
            })?;

        tracing::info!(channel = %channel, "Listening for routing changes");
        Ok(subscription)
    }

    async fn consume(&self, mut subscription: Subscription) {
        while let Some(item) = subscription.next().await {
            match item {
                Ok(raw) => {
                    self.on_change_event(&raw);
                }
                Err(e) => {
                    tracing::warn!(
                        channel = %self.config.change_channel,
                        error = %e,
                        "Error on routing change channel"
                    );
                }
            }
        }
        tracing::warn!(
            channel = %self.config.change_channel,
            "Routing change channel closed"
        );
    }
}
