//! Application registry lookups.

use std::collections::HashMap;
use std::sync::Arc;

use apiguard_core::App;
use parking_lot::RwLock;

/// Source of [`App`] entries, keyed by application name.
pub trait AppRegistry: Send + Sync {
    /// Get an application by name.
    fn get_app(&self, name: &str) -> Option<Arc<App>>;
}

/// An application registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryAppRegistry {
    apps: RwLock<HashMap<String, Arc<App>>>,
}

impl InMemoryAppRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the given applications.
    #[must_use]
    pub fn from_apps<I: IntoIterator<Item = App>>(apps: I) -> Self {
        let registry = Self::new();
        for app in apps {
            registry.insert(app);
        }
        registry
    }

    /// Load applications from a JSON array of registry entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a list of applications.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let apps: Vec<App> = serde_json::from_str(json)?;
        Ok(Self::from_apps(apps))
    }

    /// Insert or replace an application.
    pub fn insert(&self, app: App) {
        self.apps.write().insert(app.id.clone(), Arc::new(app));
    }

    /// Remove an application.
    pub fn remove(&self, name: &str) -> Option<Arc<App>> {
        self.apps.write().remove(name)
    }

    /// Number of registered applications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    /// Returns `true` if no applications are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }
}

impl AppRegistry for InMemoryAppRegistry {
    fn get_app(&self, name: &str) -> Option<Arc<App>> {
        self.apps.read().get(name).cloned()
    }
}
