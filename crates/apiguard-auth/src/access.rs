//! Authorization outcomes.

use std::fmt;
use std::sync::Arc;

use apiguard_core::ApiConfig;
use serde::{Deserialize, Serialize};

/// The outcome of one authorization check.
///
/// `Yes` lets the call through; every other variant names why it was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Access {
    /// The call may proceed.
    Yes,
    /// The app's gateway group is not served by this instance.
    CantAccessCurrentGatewayGroup,
    /// The app has no gateway group.
    NoGatewayGroupForApp,
    /// The app is missing from the registry.
    NoAppConfigForApp,
    /// The caller's IP is not on the app's white list.
    OriginIpNotInWhiteList,
    /// Signature authentication without a timestamp or signature.
    NoTimestampOrSign,
    /// The signature did not match.
    SignInvalid,
    /// Custom authentication required but no strategy is configured.
    NoCustomAuth,
    /// Authentication did not succeed.
    CustomAuthReject,
    /// The service is not on the global service white list.
    ServiceNotOpen,
    /// The app has no rules for the service.
    NoServiceExposeToApp,
    /// The app has no rule for the method and path.
    ServiceApiNotExposeToApp,
    /// The matching rule denies the call.
    CantAccessServiceApi,
}

impl Access {
    /// Human-readable reason for a refusal; `None` for [`Access::Yes`].
    #[must_use]
    pub const fn reason(self) -> Option<&'static str> {
        match self {
            Self::Yes => None,
            Self::CantAccessCurrentGatewayGroup => Some("cant access current gateway group"),
            Self::NoGatewayGroupForApp => Some("no gateway group for app"),
            Self::NoAppConfigForApp => Some("no app config for app"),
            Self::OriginIpNotInWhiteList => Some("origin ip not in white list"),
            Self::NoTimestampOrSign => Some("no timestamp or sign"),
            Self::SignInvalid => Some("sign invalid"),
            Self::NoCustomAuth => Some("no custom auth"),
            Self::CustomAuthReject => Some("custom auth reject"),
            Self::ServiceNotOpen => Some("service not open"),
            Self::NoServiceExposeToApp => Some("no service expose to app"),
            Self::ServiceApiNotExposeToApp => Some("service api not expose to app"),
            Self::CantAccessServiceApi => Some("cant access service api"),
        }
    }

    /// The stable wire code, e.g. `SERVICE_NOT_OPEN`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::CantAccessCurrentGatewayGroup => "CANT_ACCESS_CURRENT_GATEWAY_GROUP",
            Self::NoGatewayGroupForApp => "NO_GATEWAY_GROUP_FOR_APP",
            Self::NoAppConfigForApp => "NO_APP_CONFIG_FOR_APP",
            Self::OriginIpNotInWhiteList => "ORIGIN_IP_NOT_IN_WHITE_LIST",
            Self::NoTimestampOrSign => "NO_TIMESTAMP_OR_SIGN",
            Self::SignInvalid => "SIGN_INVALID",
            Self::NoCustomAuth => "NO_CUSTOM_AUTH",
            Self::CustomAuthReject => "CUSTOM_AUTH_REJECT",
            Self::ServiceNotOpen => "SERVICE_NOT_OPEN",
            Self::NoServiceExposeToApp => "NO_SERVICE_EXPOSE_TO_APP",
            Self::ServiceApiNotExposeToApp => "SERVICE_API_NOT_EXPOSE_TO_APP",
            Self::CantAccessServiceApi => "CANT_ACCESS_SERVICE_API",
        }
    }

    /// Returns `true` for [`Access::Yes`].
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Returns `true` if the refusal is a topology mismatch rather than a
    /// policy decision: the request reached an instance that does not serve
    /// the app's gateway group.
    #[must_use]
    pub const fn is_topology_error(self) -> bool {
        matches!(self, Self::CantAccessCurrentGatewayGroup)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason().unwrap_or("yes"))
    }
}

/// The result of [`AuthorizationEngine::can_access`](crate::AuthorizationEngine::can_access).
///
/// Either a bare outcome, or an accepted call carrying the rule that matched
/// it so the caller can route downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// An outcome without a matched rule.
    Access(Access),
    /// The call matched an allowing rule.
    Api(Arc<ApiConfig>),
}

impl Decision {
    /// Returns `true` if the call may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Access(access) => access.is_yes(),
            Self::Api(_) => true,
        }
    }

    /// The outcome, with a matched rule reported as [`Access::Yes`].
    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Access(access) => *access,
            Self::Api(_) => Access::Yes,
        }
    }

    /// The matched rule, if any.
    #[must_use]
    pub fn api_config(&self) -> Option<&Arc<ApiConfig>> {
        match self {
            Self::Api(ac) => Some(ac),
            Self::Access(_) => None,
        }
    }
}

impl From<Access> for Decision {
    fn from(access: Access) -> Self {
        Self::Access(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiguard_core::{GroupId, RuleAccess};

    #[test]
    fn yes_has_no_reason() {
        assert_eq!(Access::Yes.reason(), None);
        assert_eq!(Access::SignInvalid.reason(), Some("sign invalid"));
        assert_eq!(Access::ServiceNotOpen.to_string(), "service not open");
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&Access::OriginIpNotInWhiteList).unwrap();
        assert_eq!(json, "\"ORIGIN_IP_NOT_IN_WHITE_LIST\"");
    }

    #[test]
    fn code_matches_wire_form() {
        for access in [
            Access::Yes,
            Access::CantAccessCurrentGatewayGroup,
            Access::NoTimestampOrSign,
            Access::ServiceApiNotExposeToApp,
            Access::CantAccessServiceApi,
        ] {
            let json = serde_json::to_string(&access).unwrap();
            assert_eq!(json.trim_matches('"'), access.code());
        }
    }

    #[test]
    fn topology_error_is_distinct() {
        assert!(Access::CantAccessCurrentGatewayGroup.is_topology_error());
        assert!(!Access::CantAccessServiceApi.is_topology_error());
    }

    #[test]
    fn decision_accessors() {
        let rule = Arc::new(ApiConfig {
            id: 1,
            app: "partnerX".into(),
            gateway_group: GroupId::new('a'),
            service: "orders".into(),
            method: "GET".into(),
            path: "/".into(),
            access: RuleAccess::Allow,
            deleted: false,
        });

        let routed = Decision::Api(Arc::clone(&rule));
        assert!(routed.is_allowed());
        assert_eq!(routed.access(), Access::Yes);
        assert_eq!(routed.api_config(), Some(&rule));

        let denied = Decision::from(Access::SignInvalid);
        assert!(!denied.is_allowed());
        assert!(denied.api_config().is_none());
        assert!(Decision::from(Access::Yes).is_allowed());
    }
}
