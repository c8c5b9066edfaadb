//! Apiguard Gateway - authorization front end
//!
//! This is the main entry point for the gateway service. Routing rules are
//! mirrored from the control-plane store before the listener opens; a gateway
//! that cannot load them does not start.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to enable a mock custom authentication
//! strategy that accepts a request when its `fizz-secretkey` header equals
//! the app's secret.
//!
//! # Seed Data
//!
//! `ROUTE_SNAPSHOT_FILE` points at a JSON object mapping rule ids to rules,
//! loaded into the in-process store. `APP_REGISTRY_FILE` points at a JSON
//! list of registered applications.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dev-mode")]
use apiguard_auth::MockCustomAuth;
use apiguard_auth::{AuthConfig, AuthorizationEngine, InMemoryAppRegistry, StaticTopology};
use apiguard_control::{AccessIndex, ConfigSynchronizer, ServiceWhitelist, SyncConfig, WatchedValue};
use apiguard_gateway::{create_router, GatewayConfig, GatewayState};
use apiguard_store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,apiguard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Apiguard Gateway");

    // Load configuration from environment
    let gateway_config = GatewayConfig {
        listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
        gateway_groups: std::env::var("GATEWAY_GROUPS").unwrap_or_else(|_| "a".into()),
        trust_forwarded_for: std::env::var("TRUST_FORWARDED_FOR")
            .map(|v| v != "false")
            .unwrap_or(true),
        ..GatewayConfig::default()
    };
    let service_whitelist = std::env::var("SERVICE_WHITELIST").unwrap_or_default();
    let app_registry_file = std::env::var("APP_REGISTRY_FILE").ok();
    let route_snapshot_file = std::env::var("ROUTE_SNAPSHOT_FILE").ok();
    let sync_config = SyncConfig {
        subscribe_timeout_seconds: std::env::var("SUBSCRIBE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        ..SyncConfig::default()
    };

    tracing::info!(
        listen_addr = %gateway_config.listen_addr,
        gateway_groups = %gateway_config.gateway_groups,
        trust_forwarded_for = gateway_config.trust_forwarded_for,
        service_whitelist = %service_whitelist,
        app_registry_file = ?app_registry_file,
        route_snapshot_file = ?route_snapshot_file,
        subscribe_timeout = ?sync_config.subscribe_timeout(),
        "Gateway configuration loaded"
    );

    // Seed the control-plane store
    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &route_snapshot_file {
        let raw = tokio::fs::read_to_string(path).await?;
        let rules: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)?;
        tracing::info!(path = %path, rules = rules.len(), "Seeding routing rules");
        for (field, rule) in rules {
            store.put_field(&sync_config.config_key, field, rule.to_string());
        }
    }

    // Service white list, applied before rules are loaded
    let (whitelist_tx, whitelist_source) = WatchedValue::new(service_whitelist);
    let (whitelist, _whitelist_watcher) = ServiceWhitelist::watching(whitelist_source);

    // Mirror routing rules; any failure here is fatal
    let index = Arc::new(AccessIndex::new());
    let synchronizer = Arc::new(ConfigSynchronizer::new(
        store,
        Arc::clone(&index),
        sync_config,
    ));
    let _consumer = synchronizer.initialize().await.inspect_err(|e| {
        tracing::error!(error = %e, "Routing rules could not be loaded");
    })?;

    // Application registry
    let apps = match &app_registry_file {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            InMemoryAppRegistry::from_json(&raw)?
        }
        None => {
            tracing::warn!("No APP_REGISTRY_FILE set - only privileged apps can pass");
            InMemoryAppRegistry::new()
        }
    };
    tracing::info!(apps = apps.len(), "App registry loaded");

    let topology = StaticTopology::parse(&gateway_config.gateway_groups)?;

    let engine = AuthorizationEngine::new(
        Arc::clone(&index),
        Arc::clone(&whitelist),
        Arc::new(apps),
        Arc::new(topology),
        AuthConfig::default(),
    );

    #[cfg(feature = "dev-mode")]
    let engine = {
        tracing::warn!("DEV MODE ENABLED - using mock custom authentication");
        engine.with_custom_auth(Arc::new(MockCustomAuth::default()))
    };

    tracing::info!(
        has_custom_auth = engine.has_custom_auth(),
        "Authorization engine initialized"
    );

    // Build gateway state and router
    let listen_addr = gateway_config.listen_addr.clone();
    let state = GatewayState::new(
        Arc::new(engine),
        index,
        whitelist,
        whitelist_tx,
        gateway_config,
    );
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
