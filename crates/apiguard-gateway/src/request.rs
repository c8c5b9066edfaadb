//! Decision input extraction.
//!
//! Turns an inbound HTTP request into an [`AccessRequest`] using the header
//! names from [`GatewayConfig`].
//!
//! Two assumptions about the pipeline in front of the gateway:
//!
//! - With `trust_forwarded_for` set, the first forwarding header entry is the
//!   client address. The proxy in front must overwrite that header, or a
//!   direct caller can pass an app's IP white list with a forged entry.
//!   Without the flag only the peer address is used.
//! - The path arrives percent-decoded from the router, so `/a%20b` is matched
//!   against rules as `/a b`. Rules are written in decoded form.

use std::net::SocketAddr;

use axum::http::{HeaderMap, Method};

use apiguard_auth::AccessRequest;

use crate::config::GatewayConfig;
use crate::error::ApiError;

/// Build the decision input for a call to `service` at `path`.
///
/// The origin IP is the first entry of the forwarding header when it is
/// trusted, falling back to the peer address.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if the app header is missing or empty.
pub fn access_request(
    config: &GatewayConfig,
    headers: &HeaderMap,
    method: &Method,
    service: &str,
    path: &str,
    peer: Option<SocketAddr>,
) -> Result<AccessRequest, ApiError> {
    let app = header(headers, &config.app_header)
        .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", config.app_header)))?;

    let forwarded = if config.trust_forwarded_for {
        header(headers, &config.origin_ip_header)
    } else {
        None
    };
    let ip = forwarded
        .and_then(|forwarded| forwarded.split(',').map(str::trim).find(|s| !s.is_empty()))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default();

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    Ok(AccessRequest {
        timestamp: header(headers, &config.timestamp_header).map(str::to_string),
        sign: header(headers, &config.sign_header).map(str::to_string),
        secret_key: header(headers, &config.secret_key_header).map(str::to_string),
        request_id: header(headers, &config.request_id_header).map(str::to_string),
        ..AccessRequest::new(app, ip, service, method.as_str(), path)
    })
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn extracts_credentials_and_target() {
        let config = GatewayConfig::default();
        let map = headers(&[
            ("fizz-appid", "partnerX"),
            ("fizz-ts", "1000"),
            ("fizz-sign", "abc"),
            ("fizz-secretkey", "k"),
            ("x-request-id", "req-1"),
            ("x-forwarded-for", "10.0.0.1, 172.16.0.1"),
        ]);

        let request =
            access_request(&config, &map, &Method::POST, "orders", "orders/1", None).unwrap();
        assert_eq!(request.app, "partnerX");
        assert_eq!(request.ip, "10.0.0.1");
        assert_eq!(request.timestamp.as_deref(), Some("1000"));
        assert_eq!(request.sign.as_deref(), Some("abc"));
        assert_eq!(request.secret_key.as_deref(), Some("k"));
        assert_eq!(request.request_id.as_deref(), Some("req-1"));
        assert_eq!(request.service, "orders");
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/orders/1");
    }

    #[test]
    fn falls_back_to_peer_address() {
        let config = GatewayConfig::default();
        let map = headers(&[("fizz-appid", "partnerX")]);
        let peer: SocketAddr = "192.168.1.5:40000".parse().unwrap();

        let request =
            access_request(&config, &map, &Method::GET, "orders", "/x", Some(peer)).unwrap();
        assert_eq!(request.ip, "192.168.1.5");
        assert!(request.sign.is_none());

        let request = access_request(&config, &map, &Method::GET, "orders", "/x", None).unwrap();
        assert_eq!(request.ip, "");
    }

    #[test]
    fn untrusted_forwarding_header_is_ignored() {
        let config = GatewayConfig {
            trust_forwarded_for: false,
            ..GatewayConfig::default()
        };
        let map = headers(&[("fizz-appid", "partnerX"), ("x-forwarded-for", "10.0.0.1")]);
        let peer: SocketAddr = "192.168.1.5:40000".parse().unwrap();

        let request =
            access_request(&config, &map, &Method::GET, "orders", "/x", Some(peer)).unwrap();
        assert_eq!(request.ip, "192.168.1.5");

        let request = access_request(&config, &map, &Method::GET, "orders", "/x", None).unwrap();
        assert_eq!(request.ip, "");
    }

    #[test]
    fn missing_app_is_bad_request() {
        let config = GatewayConfig::default();
        let err = access_request(
            &config,
            &headers(&[("fizz-appid", " ")]),
            &Method::GET,
            "orders",
            "/",
            None,
        )
        .unwrap_err();
        assert_eq!(err.code(), "bad_request");
    }
}
