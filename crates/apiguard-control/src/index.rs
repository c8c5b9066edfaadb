//! In-memory routing table.
//!
//! The table is a tree: application → [`GatewayGroup`] → [`ServiceConfig`] →
//! rule keyed by exact `(method, path)`, plus a flat id → rule map. Both are
//! only ever changed together through [`RoutingTable::apply`].
//!
//! [`AccessIndex`] publishes the table as immutable snapshots. Writers are
//! serialized and build the next table from a copy of the current one; readers
//! load the current snapshot without locking and never observe a half-applied
//! change. Groups and services are reference counted so a copy of the table
//! only duplicates the containers a change actually touches.

use std::collections::HashMap;
use std::sync::Arc;

use apiguard_core::{ApiConfig, ApiId, GroupId};
use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Rules for one service of one application, keyed by method then path.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    apis: HashMap<String, HashMap<String, Arc<ApiConfig>>>,
}

impl ServiceConfig {
    /// Find the rule for an exact method and path.
    #[must_use]
    pub fn api_config(&self, method: &str, path: &str) -> Option<&Arc<ApiConfig>> {
        self.apis.get(method)?.get(path)
    }

    /// Iterate over every rule of the service.
    pub fn api_configs(&self) -> impl Iterator<Item = &Arc<ApiConfig>> {
        self.apis.values().flat_map(HashMap::values)
    }

    /// Number of rules in the service.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apis.values().map(HashMap::len).sum()
    }

    /// Returns `true` if the service has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }

    fn insert(&mut self, ac: Arc<ApiConfig>) -> Option<Arc<ApiConfig>> {
        self.apis
            .entry(ac.method.clone())
            .or_default()
            .insert(ac.path.clone(), ac)
    }

    /// Remove the slot for `ac`, but only if `ac` still owns it.
    fn remove(&mut self, ac: &ApiConfig) -> bool {
        let Some(paths) = self.apis.get_mut(&ac.method) else {
            return false;
        };
        if paths.get(&ac.path).map(|current| current.id) != Some(ac.id) {
            return false;
        }
        paths.remove(&ac.path);
        if paths.is_empty() {
            self.apis.remove(&ac.method);
        }
        true
    }
}

/// The gateway group an application routes through, with its services.
#[derive(Debug, Clone)]
pub struct GatewayGroup {
    id: GroupId,
    services: HashMap<String, Arc<ServiceConfig>>,
}

impl GatewayGroup {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            services: HashMap::new(),
        }
    }

    /// The group id.
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Find the rules exposed for a service.
    #[must_use]
    pub fn service_config(&self, service: &str) -> Option<&ServiceConfig> {
        self.services.get(service).map(AsRef::as_ref)
    }

    /// Iterate over `(service id, rules)` pairs.
    pub fn services(&self) -> impl Iterator<Item = (&str, &ServiceConfig)> {
        self.services
            .iter()
            .map(|(id, sc)| (id.as_str(), sc.as_ref()))
    }

    /// Returns `true` if the group has no services left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Set the rule's `(method, path)` slot, returning whatever it displaced.
    fn add(&mut self, ac: Arc<ApiConfig>) -> Option<Arc<ApiConfig>> {
        let sc = self.services.entry(ac.service.clone()).or_default();
        Arc::make_mut(sc).insert(ac)
    }

    fn remove(&mut self, ac: &ApiConfig) -> bool {
        let Some(sc) = self.services.get_mut(&ac.service) else {
            return false;
        };
        let removed = Arc::make_mut(sc).remove(ac);
        if sc.is_empty() {
            self.services.remove(&ac.service);
        }
        removed
    }
}

/// What applying a rule did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A rule with a new id was stored.
    Inserted,
    /// A stored rule was replaced.
    Updated,
    /// A stored rule was deleted.
    Retracted,
    /// A deletion arrived for an id that was not stored.
    Ignored,
}

/// One consistent version of the routing table.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    app_groups: HashMap<String, Arc<GatewayGroup>>,
    api_configs: HashMap<ApiId, Arc<ApiConfig>>,
}

impl RoutingTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The gateway group an application routes through.
    #[must_use]
    pub fn gateway_group(&self, app: &str) -> Option<&GatewayGroup> {
        self.app_groups.get(app).map(AsRef::as_ref)
    }

    /// Find the rule for an exact `(app, service, method, path)`.
    #[must_use]
    pub fn lookup(
        &self,
        app: &str,
        service: &str,
        method: &str,
        path: &str,
    ) -> Option<&Arc<ApiConfig>> {
        self.gateway_group(app)?
            .service_config(service)?
            .api_config(method, path)
    }

    /// Find a live rule by id.
    #[must_use]
    pub fn api_config(&self, id: ApiId) -> Option<&Arc<ApiConfig>> {
        self.api_configs.get(&id)
    }

    /// Iterate over `(app, group)` pairs.
    pub fn app_groups(&self) -> impl Iterator<Item = (&str, &GatewayGroup)> {
        self.app_groups
            .iter()
            .map(|(app, gg)| (app.as_str(), gg.as_ref()))
    }

    /// Number of live rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.api_configs.len()
    }

    /// Returns `true` if no rules are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_configs.is_empty()
    }

    /// Number of applications with a gateway group.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.app_groups.len()
    }

    /// Apply one rule change, last write wins.
    ///
    /// Any stored rule with the same id is retracted first. A deleted rule is
    /// never stored; a live one is inserted into both the tree and the flat
    /// map. A live rule that takes over another id's `(method, path)` slot
    /// evicts that id, so every stored id stays reachable through the tree.
    pub fn apply(&mut self, ac: ApiConfig) -> Applied {
        let previous = self.api_configs.remove(&ac.id);
        if let Some(prev) = &previous {
            self.remove(prev);
        }

        if ac.deleted {
            return if previous.is_some() {
                Applied::Retracted
            } else {
                Applied::Ignored
            };
        }

        let ac = Arc::new(ac);
        if let Some(displaced) = self.add(Arc::clone(&ac)) {
            tracing::warn!(
                app = %ac.app,
                service = %ac.service,
                method = %ac.method,
                path = %ac.path,
                rule_id = ac.id,
                displaced_id = displaced.id,
                "Rule replaced another rule's slot"
            );
            self.api_configs.remove(&displaced.id);
        }
        self.api_configs.insert(ac.id, ac);

        if previous.is_some() {
            Applied::Updated
        } else {
            Applied::Inserted
        }
    }

    fn add(&mut self, ac: Arc<ApiConfig>) -> Option<Arc<ApiConfig>> {
        let group = self
            .app_groups
            .entry(ac.app.clone())
            .or_insert_with(|| Arc::new(GatewayGroup::new(ac.gateway_group)));
        let group = Arc::make_mut(group);
        if group.id != ac.gateway_group {
            tracing::warn!(
                app = %ac.app,
                from = %group.id,
                to = %ac.gateway_group,
                rule_id = ac.id,
                "App moved to another gateway group"
            );
            group.id = ac.gateway_group;
        }
        group.add(ac)
    }

    fn remove(&mut self, ac: &ApiConfig) -> bool {
        let Some(group) = self.app_groups.get_mut(&ac.app) else {
            tracing::info!(app = %ac.app, rule_id = ac.id, "No gateway group for app");
            return false;
        };
        let group = Arc::make_mut(group);
        let removed = group.remove(ac);
        if group.is_empty() {
            self.app_groups.remove(&ac.app);
        }
        removed
    }
}

/// The live routing table shared by the synchronizer and every request.
#[derive(Debug, Default)]
pub struct AccessIndex {
    current: ArcSwap<RoutingTable>,
    writer: Mutex<()>,
}

impl AccessIndex {
    /// Create an index holding an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current table. The snapshot never changes once loaded.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.current.load_full()
    }

    /// Find the rule for an exact `(app, service, method, path)`.
    #[must_use]
    pub fn lookup(
        &self,
        app: &str,
        service: &str,
        method: &str,
        path: &str,
    ) -> Option<Arc<ApiConfig>> {
        self.current
            .load()
            .lookup(app, service, method, path)
            .cloned()
    }

    /// Apply one rule change and publish the result.
    pub fn apply(&self, ac: ApiConfig) -> Applied {
        self.update(|table| table.apply(ac))
    }

    /// Apply rule changes in order and publish the result once.
    pub fn apply_all<I>(&self, changes: I) -> Vec<Applied>
    where
        I: IntoIterator<Item = ApiConfig>,
    {
        self.update(|table| changes.into_iter().map(|ac| table.apply(ac)).collect())
    }

    fn update<R>(&self, f: impl FnOnce(&mut RoutingTable) -> R) -> R {
        let _writer = self.writer.lock();
        let mut next = RoutingTable::clone(&self.current.load());
        let result = f(&mut next);
        self.current.store(Arc::new(next));
        result
    }
}
