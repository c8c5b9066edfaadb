//! Globally enabled services.
//!
//! The whitelist is derived from one hot-reloadable, comma-separated value.
//! A service missing from it is closed for every application, whatever the
//! per-application rules say.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A configuration value that can change while the gateway runs.
///
/// Holders see the latest value and are notified of every change; the
/// [`watch::Sender`] returned by [`WatchedValue::new`] is the change source.
#[derive(Debug, Clone)]
pub struct WatchedValue<T> {
    rx: watch::Receiver<T>,
}

impl<T> WatchedValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a watched value and the sender used to change it.
    #[must_use]
    pub fn new(initial: T) -> (watch::Sender<T>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }

    /// The latest value, marking it as seen.
    pub fn current(&mut self) -> T {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the sender is gone and no change can follow.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Run `handler` for every change until the sender is dropped.
    pub fn spawn_handler<F>(mut self, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(&T) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(value) = self.changed().await {
                handler(&value);
            }
            tracing::debug!("Watched value source closed");
        })
    }
}

/// The set of services open to every application.
#[derive(Debug, Default)]
pub struct ServiceWhitelist {
    services: ArcSwap<HashSet<String>>,
}

impl ServiceWhitelist {
    /// Build a whitelist from a comma-separated source value.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let services = Self::parse(source);
        tracing::info!(services = ?services, "Service white list loaded");
        Self {
            services: ArcSwap::from_pointee(services),
        }
    }

    /// Build a whitelist from a watched value and keep it current.
    ///
    /// The current value is applied before this returns; later values are
    /// applied by the returned task.
    #[must_use]
    pub fn watching(mut source: WatchedValue<String>) -> (Arc<Self>, JoinHandle<()>) {
        let whitelist = Arc::new(Self::new(&source.current()));
        let handle = {
            let whitelist = Arc::clone(&whitelist);
            source.spawn_handler(move |value| whitelist.reload(value))
        };
        (whitelist, handle)
    }

    /// Split a source value into service ids, skipping blanks.
    #[must_use]
    pub fn parse(source: &str) -> HashSet<String> {
        source
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns `true` if `service` is open.
    #[must_use]
    pub fn contains(&self, service: &str) -> bool {
        self.services.load().contains(service)
    }

    /// The current set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashSet<String>> {
        self.services.load_full()
    }

    /// Replace the set from a new source value.
    ///
    /// The new set is built first and swapped in whole, so readers see either
    /// the old set or the new one. An empty source closes every service.
    pub fn reload(&self, source: &str) {
        let services = Self::parse(source);
        if services.is_empty() {
            tracing::warn!("Service white list is empty, every service is closed");
        }
        let new = Arc::new(services);
        let old = self.services.swap(Arc::clone(&new));
        tracing::info!(old = ?old, new = ?new, "Service white list reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn settle<F: Fn() -> bool>(done: F) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[test]
    fn parse_skips_blanks() {
        let set = ServiceWhitelist::parse("orders, billing,,  ,");
        assert_eq!(set.len(), 2);
        assert!(set.contains("orders"));
        assert!(set.contains("billing"));
        assert!(ServiceWhitelist::parse("").is_empty());
    }

    #[test]
    fn reload_replaces_whole_set() {
        let whitelist = ServiceWhitelist::new("orders,billing");
        let before = whitelist.snapshot();

        whitelist.reload("billing,users");

        assert!(!whitelist.contains("orders"));
        assert!(whitelist.contains("users"));
        assert!(before.contains("orders"));
    }

    #[test]
    fn empty_source_closes_everything() {
        let whitelist = ServiceWhitelist::new("orders,billing");
        whitelist.reload("");
        assert!(!whitelist.contains("orders"));
        assert!(!whitelist.contains("billing"));
    }

    #[test]
    fn readers_never_see_an_empty_set_during_reload() {
        let whitelist = Arc::new(ServiceWhitelist::new("orders"));
        let writer = {
            let whitelist = Arc::clone(&whitelist);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    whitelist.reload(&format!("orders,extra{i}"));
                }
            })
        };
        for _ in 0..1000 {
            assert!(whitelist.contains("orders"));
        }
        writer.join().unwrap();
    }

    #[tokio::test]
    async fn watching_applies_initial_and_later_values() {
        let (tx, value) = WatchedValue::new("orders".to_string());
        let (whitelist, handle) = ServiceWhitelist::watching(value);
        assert!(whitelist.contains("orders"));

        tx.send("orders,billing".to_string()).unwrap();
        settle(|| whitelist.contains("billing")).await;

        tx.send(String::new()).unwrap();
        settle(|| !whitelist.contains("orders")).await;

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn changed_ends_when_sender_dropped() {
        let (tx, mut value) = WatchedValue::new(1u32);
        assert_eq!(value.current(), 1);
        tx.send(2).unwrap();
        assert_eq!(value.changed().await, Some(2));
        drop(tx);
        assert_eq!(value.changed().await, None);
    }
}
