//! The per-request authorization decision.
//!
//! [`AuthorizationEngine::can_access`] runs a fixed chain of checks and stops
//! at the first refusal:
//!
//! 1. the app must have a gateway group (privileged apps pass without one)
//! 2. that group must be served by this instance
//! 3. the app must be registered (privileged apps continue without an entry)
//! 4. origin IP white list, then signature or custom authentication
//! 5. a failed authentication is reported as `CUSTOM_AUTH_REJECT`
//! 6. the service must be on the global white list
//! 7. the app must have rules for the service (privileged apps pass)
//! 8. the app must have a rule for the method and path (privileged apps pass)
//! 9. the rule must allow the call
//!
//! Every refusal is logged with the request's identifying context.

use std::sync::Arc;

use apiguard_control::{AccessIndex, ServiceWhitelist};
use apiguard_core::{App, AuthType};

use crate::access::{Access, Decision};
use crate::custom::CustomAuth;
use crate::registry::AppRegistry;
use crate::sign;
use crate::topology::TopologyProvider;
use crate::AuthConfig;

/// Everything the engine needs to know about one inbound call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequest {
    /// Calling application name.
    pub app: String,
    /// Origin IP of the caller.
    pub ip: String,
    /// Signature timestamp, if sent.
    pub timestamp: Option<String>,
    /// Request signature, if sent.
    pub sign: Option<String>,
    /// Secret key header, if sent; only custom strategies look at it.
    pub secret_key: Option<String>,
    /// Target service id.
    pub service: String,
    /// HTTP method name.
    pub method: String,
    /// Request path within the service.
    pub path: String,
    /// Request id for log correlation.
    pub request_id: Option<String>,
}

impl AccessRequest {
    /// Create a request without credentials.
    #[must_use]
    pub fn new(
        app: impl Into<String>,
        ip: impl Into<String>,
        service: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            app: app.into(),
            ip: ip.into(),
            service: service.into(),
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Attach a signature and its timestamp.
    #[must_use]
    pub fn with_sign(mut self, timestamp: impl Into<String>, sign: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self.sign = Some(sign.into());
        self
    }
}

/// Decides whether an application may invoke a backend API.
pub struct AuthorizationEngine {
    index: Arc<AccessIndex>,
    whitelist: Arc<ServiceWhitelist>,
    apps: Arc<dyn AppRegistry>,
    topology: Arc<dyn TopologyProvider>,
    custom_auth: Option<Arc<dyn CustomAuth>>,
    config: AuthConfig,
}

impl AuthorizationEngine {
    /// Create an engine without a custom authentication strategy.
    #[must_use]
    pub fn new(
        index: Arc<AccessIndex>,
        whitelist: Arc<ServiceWhitelist>,
        apps: Arc<dyn AppRegistry>,
        topology: Arc<dyn TopologyProvider>,
        config: AuthConfig,
    ) -> Self {
        Self {
            index,
            whitelist,
            apps,
            topology,
            custom_auth: None,
            config,
        }
    }

    /// Use `strategy` for apps configured with custom authentication.
    #[must_use]
    pub fn with_custom_auth(mut self, strategy: Arc<dyn CustomAuth>) -> Self {
        self.custom_auth = Some(strategy);
        self
    }

    /// Returns `true` if a custom authentication strategy is configured.
    #[must_use]
    pub fn has_custom_auth(&self) -> bool {
        self.custom_auth.is_some()
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Decide whether `request` may proceed.
    ///
    /// The decision reads one routing snapshot from start to finish. It only
    /// suspends while a custom strategy runs; dropping the future cancels the
    /// strategy call.
    pub async fn can_access(&self, request: &AccessRequest) -> Decision {
        let table = self.index.snapshot();
        let privileged = self.config.is_privileged(&request.app);

        let Some(group) = table.gateway_group(&request.app) else {
            if privileged {
                return Decision::Access(Access::Yes);
            }
            return reject(request, Access::NoGatewayGroupForApp, "no gateway group");
        };

        let owned = self.topology.owned_group_ids();
        if !owned.contains(&group.id()) {
            tracing::warn!(
                app = %request.app,
                group = %group.id(),
                owned = ?owned,
                request_id = request.request_id.as_deref(),
                "App's gateway group is not served here"
            );
            return Decision::Access(Access::CantAccessCurrentGatewayGroup);
        }

        let authenticated = match self.apps.get_app(&request.app) {
            None if privileged => Access::Yes,
            None => return reject(request, Access::NoAppConfigForApp, "app not registered"),
            Some(app) => match self.authenticate(request, &app).await {
                Ok(access) => access,
                Err(refusal) => return Decision::Access(refusal),
            },
        };

        if !authenticated.is_yes() {
            return reject(request, Access::CustomAuthReject, "authentication rejected");
        }

        if !self.whitelist.contains(&request.service) {
            return reject(request, Access::ServiceNotOpen, "service not on white list");
        }

        let Some(service) = group.service_config(&request.service) else {
            if privileged {
                return Decision::Access(Access::Yes);
            }
            return reject(request, Access::NoServiceExposeToApp, "no rules for service");
        };

        let Some(ac) = service.api_config(&request.method, &request.path) else {
            if privileged {
                return Decision::Access(Access::Yes);
            }
            return reject(request, Access::ServiceApiNotExposeToApp, "no rule for api");
        };

        if ac.is_allowed() {
            tracing::debug!(
                app = %request.app,
                service = %request.service,
                rule_id = ac.id,
                "Access granted"
            );
            Decision::Api(Arc::clone(ac))
        } else {
            reject(request, Access::CantAccessServiceApi, "rule denies api")
        }
    }

    /// IP white list and credential checks for a registered app.
    ///
    /// `Err` is a final refusal. `Ok` carries the authentication outcome,
    /// which the caller normalizes.
    async fn authenticate(&self, request: &AccessRequest, app: &App) -> Result<Access, Access> {
        if !app.permits_ip(&request.ip) {
            return Err(refusal(request, Access::OriginIpNotInWhiteList, "ip not on app white list"));
        }
        if !app.use_auth {
            return Ok(Access::Yes);
        }

        match app.auth_type {
            AuthType::Sign => {
                let (Some(timestamp), Some(signature)) = (
                    non_blank(request.timestamp.as_deref()),
                    non_blank(request.sign.as_deref()),
                ) else {
                    return Err(refusal(request, Access::NoTimestampOrSign, "missing timestamp or sign"));
                };
                if !sign::verify(&request.app, timestamp, &app.secret_key, signature) {
                    return Err(refusal(request, Access::SignInvalid, "signature mismatch"));
                }
                Ok(Access::Yes)
            }
            AuthType::Custom => {
                let Some(strategy) = &self.custom_auth else {
                    return Err(refusal(request, Access::NoCustomAuth, "no custom auth configured"));
                };
                Ok(self.run_custom_auth(strategy.as_ref(), request, app).await)
            }
        }
    }

    async fn run_custom_auth(
        &self,
        strategy: &dyn CustomAuth,
        request: &AccessRequest,
        app: &App,
    ) -> Access {
        let timeout = self.config.custom_auth_timeout();
        match tokio::time::timeout(timeout, strategy.authenticate(request, app)).await {
            Ok(Ok(access)) => access,
            Ok(Err(e)) => {
                tracing::warn!(
                    app = %request.app,
                    error = %e,
                    retriable = e.is_retriable(),
                    request_id = request.request_id.as_deref(),
                    "Custom auth failed"
                );
                Access::CustomAuthReject
            }
            Err(_) => {
                tracing::warn!(
                    app = %request.app,
                    ?timeout,
                    request_id = request.request_id.as_deref(),
                    "Custom auth timed out"
                );
                Access::CustomAuthReject
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn refusal(request: &AccessRequest, access: Access, detail: &str) -> Access {
    tracing::warn!(
        app = %request.app,
        ip = %request.ip,
        service = %request.service,
        method = %request.method,
        path = %request.path,
        request_id = request.request_id.as_deref(),
        reason = access.reason(),
        detail,
        "Access rejected"
    );
    access
}

fn reject(request: &AccessRequest, access: Access, detail: &str) -> Decision {
    Decision::Access(refusal(request, access, detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::MockCustomAuth;
    use crate::registry::InMemoryAppRegistry;
    use crate::topology::StaticTopology;
    use apiguard_core::{ApiConfig, GroupId, RuleAccess};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct Fixture {
        index: Arc<AccessIndex>,
        whitelist: Arc<ServiceWhitelist>,
        apps: Arc<InMemoryAppRegistry>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                index: Arc::new(AccessIndex::new()),
                whitelist: Arc::new(ServiceWhitelist::new("orders,billing")),
                apps: Arc::new(InMemoryAppRegistry::new()),
            }
        }

        fn rule(&self, id: i64, app: &str, group: char, path: &str, access: RuleAccess) {
            self.index.apply(ApiConfig {
                id,
                app: app.to_string(),
                gateway_group: GroupId::new(group),
                service: "orders".to_string(),
                method: "GET".to_string(),
                path: path.to_string(),
                access,
                deleted: false,
            });
        }

        fn engine(&self) -> AuthorizationEngine {
            AuthorizationEngine::new(
                Arc::clone(&self.index),
                Arc::clone(&self.whitelist),
                Arc::clone(&self.apps) as Arc<dyn AppRegistry>,
                Arc::new(StaticTopology::new([GroupId::new('a')])),
                AuthConfig::default(),
            )
        }
    }

    fn orders(app: &str, path: &str) -> AccessRequest {
        AccessRequest::new(app, "10.0.0.1", "orders", "GET", path)
    }

    #[tokio::test]
    async fn privileged_app_without_group_passes() {
        let fx = Fixture::new();
        let decision = fx.engine().can_access(&orders("toC", "/orders")).await;
        assert_eq!(decision, Decision::Access(Access::Yes));
    }

    #[tokio::test]
    async fn unknown_app_without_group() {
        let fx = Fixture::new();
        let decision = fx.engine().can_access(&orders("stranger", "/orders")).await;
        assert_eq!(decision.access(), Access::NoGatewayGroupForApp);
    }

    #[tokio::test]
    async fn group_served_elsewhere() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'z', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::CantAccessCurrentGatewayGroup);
    }

    #[tokio::test]
    async fn unregistered_app() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::NoAppConfigForApp);
    }

    #[tokio::test]
    async fn unregistered_privileged_app_continues() {
        let fx = Fixture::new();
        fx.rule(1, "toB", 'a', "/orders", RuleAccess::Allow);

        let decision = fx.engine().can_access(&orders("toB", "/orders")).await;
        assert_eq!(decision.api_config().map(|ac| ac.id), Some(1));

        let other = fx.engine().can_access(&orders("toB", "/missing")).await;
        assert_eq!(other, Decision::Access(Access::Yes));
    }

    #[tokio::test]
    async fn origin_ip_not_in_white_list() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_ips(["10.0.0.1"]));

        let mut request = orders("partnerX", "/orders");
        request.ip = "10.0.0.2".to_string();
        let decision = fx.engine().can_access(&request).await;
        assert_eq!(decision.access(), Access::OriginIpNotInWhiteList);

        request.ip = "10.0.0.1".to_string();
        assert!(fx.engine().can_access(&request).await.is_allowed());
    }

    #[tokio::test]
    async fn valid_signature_proceeds() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_sign("s3cret"));

        let sign = sign::expected_sign("partnerX", "1000", "s3cret");
        let request = orders("partnerX", "/orders").with_sign("1000", sign);
        let decision = fx.engine().can_access(&request).await;
        assert_eq!(decision.api_config().map(|ac| ac.id), Some(1));
    }

    #[tokio::test]
    async fn missing_or_blank_signature() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_sign("s3cret"));
        let engine = fx.engine();

        let decision = engine.can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::NoTimestampOrSign);

        let blank = orders("partnerX", "/orders").with_sign("1000", "  ");
        assert_eq!(engine.can_access(&blank).await.access(), Access::NoTimestampOrSign);
    }

    #[tokio::test]
    async fn wrong_signature() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_sign("s3cret"));

        let sign = sign::expected_sign("partnerX", "1000", "wrong");
        let request = orders("partnerX", "/orders").with_sign("1000", sign);
        let decision = fx.engine().can_access(&request).await;
        assert_eq!(decision.access(), Access::SignInvalid);
    }

    #[tokio::test]
    async fn custom_auth_not_configured() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_custom_auth());

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::NoCustomAuth);
    }

    #[tokio::test]
    async fn custom_auth_accepts_and_rejects() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        let mut app = App::open("partnerX").with_custom_auth();
        app.secret_key = "k".to_string();
        fx.apps.insert(app);
        let engine = fx.engine().with_custom_auth(Arc::new(MockCustomAuth::default()));
        assert!(engine.has_custom_auth());

        let mut request = orders("partnerX", "/orders");
        request.secret_key = Some("k".to_string());
        assert!(engine.can_access(&request).await.is_allowed());

        request.secret_key = Some("nope".to_string());
        assert_eq!(engine.can_access(&request).await.access(), Access::CustomAuthReject);
    }

    #[tokio::test]
    async fn custom_auth_fault_is_a_rejection() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_custom_auth());
        let engine = fx.engine().with_custom_auth(Arc::new(MockCustomAuth {
            fail: true,
            ..Default::default()
        }));

        let decision = engine.can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::CustomAuthReject);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_custom_auth_times_out() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_custom_auth());
        let engine = fx.engine().with_custom_auth(Arc::new(MockCustomAuth {
            stall: true,
            ..Default::default()
        }));

        let decision = engine.can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::CustomAuthReject);
    }

    #[tokio::test]
    async fn service_not_open_despite_allow_rule() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));
        fx.whitelist.reload("billing");

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::ServiceNotOpen);
    }

    #[tokio::test]
    async fn whitelist_reload_to_empty_closes_everything() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));
        let engine = fx.engine();

        fx.whitelist.reload("orders,billing");
        assert!(engine.can_access(&orders("partnerX", "/orders")).await.is_allowed());

        fx.rule(2, "toC", 'a', "/orders", RuleAccess::Allow);
        fx.whitelist.reload("");
        for app in ["partnerX", "toC"] {
            let decision = engine.can_access(&orders(app, "/orders")).await;
            assert_eq!(decision.access(), Access::ServiceNotOpen);
        }
    }

    #[tokio::test]
    async fn no_rules_for_service() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));

        let mut request = orders("partnerX", "/orders");
        request.service = "billing".to_string();
        let decision = fx.engine().can_access(&request).await;
        assert_eq!(decision.access(), Access::NoServiceExposeToApp);
    }

    #[tokio::test]
    async fn no_rule_for_api() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));

        let decision = fx.engine().can_access(&orders("partnerX", "/orders/")).await;
        assert_eq!(decision.access(), Access::ServiceApiNotExposeToApp);
    }

    #[tokio::test]
    async fn deny_rule() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Deny);
        fx.apps.insert(App::open("partnerX"));

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        assert_eq!(decision.access(), Access::CantAccessServiceApi);
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn allow_rule_returns_matched_rule() {
        let fx = Fixture::new();
        fx.rule(5, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX"));

        let decision = fx.engine().can_access(&orders("partnerX", "/orders")).await;
        let ac = decision.api_config().unwrap();
        assert_eq!(ac.id, 5);
        assert_eq!(ac.service, "orders");
    }

    #[tokio::test]
    async fn privileged_app_without_service_rules_passes() {
        let fx = Fixture::new();
        fx.rule(1, "toC", 'a', "/orders", RuleAccess::Allow);

        let mut request = orders("toC", "/orders");
        request.service = "billing".to_string();
        let decision = fx.engine().can_access(&request).await;
        assert_eq!(decision, Decision::Access(Access::Yes));
    }

    #[tokio::test]
    async fn any_failed_custom_outcome_is_a_rejection() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_custom_auth());

        for outcome in [Access::SignInvalid, Access::NoServiceExposeToApp, Access::ServiceNotOpen] {
            let engine = fx.engine().with_custom_auth(Arc::new(MockCustomAuth {
                outcome: Some(outcome),
                ..Default::default()
            }));
            let decision = engine.can_access(&orders("partnerX", "/orders")).await;
            assert_eq!(decision.access(), Access::CustomAuthReject);
        }
    }

    /// Stalls forever, recording when it starts and when its future is dropped.
    #[derive(Default)]
    struct StallingAuth {
        started: Arc<AtomicBool>,
        dropped: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl CustomAuth for StallingAuth {
        async fn authenticate(
            &self,
            _request: &AccessRequest,
            _app: &App,
        ) -> crate::error::Result<Access> {
            let _guard = SetOnDrop(Arc::clone(&self.dropped));
            self.started.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(Access::Yes)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_decision_cancels_custom_auth() {
        let fx = Fixture::new();
        fx.rule(1, "partnerX", 'a', "/orders", RuleAccess::Allow);
        fx.apps.insert(App::open("partnerX").with_custom_auth());

        let strategy = StallingAuth::default();
        let started = Arc::clone(&strategy.started);
        let dropped = Arc::clone(&strategy.dropped);
        let engine = fx.engine().with_custom_auth(Arc::new(strategy));

        let request = orders("partnerX", "/orders");
        let outcome =
            tokio::time::timeout(Duration::from_millis(10), engine.can_access(&request)).await;

        assert!(outcome.is_err());
        assert!(started.load(Ordering::SeqCst));
        assert!(dropped.load(Ordering::SeqCst));
    }
}
