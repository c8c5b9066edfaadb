//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP front end.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Comma-separated gateway group ids served by this instance.
    #[serde(default = "GatewayConfig::default_gateway_groups")]
    pub gateway_groups: String,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Header carrying the calling application's name.
    #[serde(default = "GatewayConfig::default_app_header")]
    pub app_header: String,

    /// Header carrying the request signature.
    #[serde(default = "GatewayConfig::default_sign_header")]
    pub sign_header: String,

    /// Header carrying the signature timestamp.
    #[serde(default = "GatewayConfig::default_timestamp_header")]
    pub timestamp_header: String,

    /// Header carrying the secret key for custom authentication.
    #[serde(default = "GatewayConfig::default_secret_key_header")]
    pub secret_key_header: String,

    /// Header listing the client and proxy addresses.
    #[serde(default = "GatewayConfig::default_origin_ip_header")]
    pub origin_ip_header: String,

    /// Take the origin IP from the forwarding header.
    ///
    /// Only safe behind a proxy that overwrites the header; otherwise any
    /// caller can claim an address on an app's IP white list.
    #[serde(default = "GatewayConfig::default_trust_forwarded_for")]
    pub trust_forwarded_for: bool,

    /// Header carrying a request id for log correlation.
    #[serde(default = "GatewayConfig::default_request_id_header")]
    pub request_id_header: String,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_gateway_groups() -> String {
        "a".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    fn default_app_header() -> String {
        "fizz-appid".to_string()
    }

    fn default_sign_header() -> String {
        "fizz-sign".to_string()
    }

    fn default_timestamp_header() -> String {
        "fizz-ts".to_string()
    }

    fn default_secret_key_header() -> String {
        "fizz-secretkey".to_string()
    }

    fn default_origin_ip_header() -> String {
        "x-forwarded-for".to_string()
    }

    const fn default_trust_forwarded_for() -> bool {
        true
    }

    fn default_request_id_header() -> String {
        "x-request-id".to_string()
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            gateway_groups: Self::default_gateway_groups(),
            request_timeout_seconds: Self::default_request_timeout(),
            app_header: Self::default_app_header(),
            sign_header: Self::default_sign_header(),
            timestamp_header: Self::default_timestamp_header(),
            secret_key_header: Self::default_secret_key_header(),
            origin_ip_header: Self::default_origin_ip_header(),
            trust_forwarded_for: Self::default_trust_forwarded_for(),
            request_id_header: Self::default_request_id_header(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.gateway_groups, "a");
        assert_eq!(config.sign_header, "fizz-sign");
        assert_eq!(config.timestamp_header, "fizz-ts");
        assert_eq!(config.origin_ip_header, "x-forwarded-for");
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn timeout_duration() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"gateway_groups":"a,b","app_header":"x-app"}"#).unwrap();
        assert_eq!(config.gateway_groups, "a,b");
        assert_eq!(config.app_header, "x-app");
        assert_eq!(config.secret_key_header, "fizz-secretkey");
        assert_eq!(config.request_timeout_seconds, 30);
    }
}
