//! In-process implementation of [`ConfigStore`].
//!
//! `MemoryStore` keeps hashes and channel subscribers in memory. It backs the
//! standalone gateway binary and the synchronizer tests, and can be told to
//! misbehave the way a real store does.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Result, StoreError};
use crate::{ConfigStore, Subscription};

/// A failure mode injected into a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every call fails with `StoreError::Connection`.
    Unavailable,
    /// Subscriptions are never acknowledged.
    Unresponsive,
}

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, HashMap<String, String>>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Result<String>>>>,
    fault: Option<Fault>,
}

/// An in-memory hash and pub/sub store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field of a hash, creating the hash if needed.
    pub fn put_field(&self, key: &str, field: impl Into<String>, value: impl Into<String>) {
        self.inner
            .lock()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.into(), value.into());
    }

    /// Remove a field from a hash.
    pub fn remove_field(&self, key: &str, field: &str) -> Option<String> {
        self.inner
            .lock()
            .hashes
            .get_mut(key)
            .and_then(|hash| hash.remove(field))
    }

    /// Publish a message to every live subscriber of a channel.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, channel: &str, message: impl Into<String>) -> usize {
        self.send(channel, Ok(message.into()))
    }

    /// Deliver a transport error to every live subscriber of a channel.
    pub fn publish_error(&self, channel: &str, error: StoreError) -> usize {
        self.send(channel, Err(error))
    }

    /// Close a channel, ending every subscription to it.
    pub fn close_channel(&self, channel: &str) {
        self.inner.lock().subscribers.remove(channel);
    }

    /// Inject or clear a failure mode.
    pub fn set_fault(&self, fault: Option<Fault>) {
        self.inner.lock().fault = fault;
    }

    /// Number of live subscribers on a channel.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .lock()
            .subscribers
            .get(channel)
            .map_or(0, |subs| subs.iter().filter(|s| !s.is_closed()).count())
    }

    fn send(&self, channel: &str, item: Result<String>) -> usize {
        let mut inner = self.inner.lock();
        let Some(subs) = inner.subscribers.get_mut(channel) else {
            return 0;
        };
        subs.retain(|tx| tx.send(item.clone()).is_ok());
        subs.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.lock().fault == Some(Fault::Unavailable) {
            return Err(StoreError::Connection("memory store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>> {
        self.check_available()?;
        Ok(self.inner.lock().hashes.get(key).cloned().unwrap_or_default())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        self.check_available()?;
        let unresponsive = self.inner.lock().fault == Some(Fault::Unresponsive);
        if unresponsive {
            std::future::pending::<()>().await;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);

        tracing::debug!(channel = %channel, "Subscribed");

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}
