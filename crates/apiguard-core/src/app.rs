//! Application registry entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// How an application proves its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    /// Keyed digest over app, timestamp and secret.
    Sign,
    /// Delegated to the configured custom authentication strategy.
    Custom,
}

/// A calling application as described by the app registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Application name, as sent by callers.
    pub id: String,
    /// Whether origin IPs are restricted to [`App::ips`].
    #[serde(default)]
    pub use_white_list: bool,
    /// Permitted origin IPs.
    #[serde(default)]
    pub ips: HashSet<String>,
    /// Whether the caller must authenticate.
    #[serde(default)]
    pub use_auth: bool,
    /// Authentication scheme used when [`App::use_auth`] is set.
    #[serde(default = "App::default_auth_type")]
    pub auth_type: AuthType,
    /// Shared secret for signature authentication.
    #[serde(default)]
    pub secret_key: String,
}

impl App {
    const fn default_auth_type() -> AuthType {
        AuthType::Sign
    }

    /// Create an application with no IP restriction and no authentication.
    #[must_use]
    pub fn open(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            use_white_list: false,
            ips: HashSet::new(),
            use_auth: false,
            auth_type: AuthType::Sign,
            secret_key: String::new(),
        }
    }

    /// Restrict origin IPs to the given set.
    #[must_use]
    pub fn with_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_white_list = true;
        self.ips = ips.into_iter().map(Into::into).collect();
        self
    }

    /// Require signature authentication with the given secret.
    #[must_use]
    pub fn with_sign(mut self, secret_key: impl Into<String>) -> Self {
        self.use_auth = true;
        self.auth_type = AuthType::Sign;
        self.secret_key = secret_key.into();
        self
    }

    /// Require the custom authentication strategy.
    #[must_use]
    pub fn with_custom_auth(mut self) -> Self {
        self.use_auth = true;
        self.auth_type = AuthType::Custom;
        self
    }

    /// Returns `true` if `ip` may call on behalf of this application.
    #[must_use]
    pub fn permits_ip(&self, ip: &str) -> bool {
        !self.use_white_list || self.ips.contains(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_app_permits_any_ip() {
        let app = App::open("partnerX");
        assert!(app.permits_ip("10.0.0.2"));
        assert!(!app.use_auth);
    }

    #[test]
    fn ip_white_list() {
        let app = App::open("partnerX").with_ips(["10.0.0.1"]);
        assert!(app.permits_ip("10.0.0.1"));
        assert!(!app.permits_ip("10.0.0.2"));
    }

    #[test]
    fn deserialize_registry_entry() {
        let json = r#"{"id":"partnerX","useWhiteList":true,"ips":["10.0.0.1"],"useAuth":true,"authType":"CUSTOM"}"#;
        let app: App = serde_json::from_str(json).unwrap();
        assert_eq!(app.auth_type, AuthType::Custom);
        assert!(app.use_white_list);
        assert!(app.secret_key.is_empty());
    }
}
