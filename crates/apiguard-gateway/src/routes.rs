//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use axum::routing::{any, get};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{access, admin, health};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Health
/// - `GET /health` - Health check
/// - `GET /ready` - Routing mirror summary
///
/// ## Authorization
/// - `ANY /proxy/:service/*path` - Decide whether the calling app may invoke the API
/// - `ANY /proxy/:service[/]` - Same, for the service's root path `/`
///
/// ## Diagnostics
/// - `GET /admin/gateway-groups` - App to gateway group index
/// - `GET /admin/whitelist` - Open services
/// - `PUT /admin/whitelist` - Replace the white list source value
pub fn create_router(state: GatewayState) -> Router {
    let request_timeout = state.config.request_timeout();

    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        // Authorization
        .route("/proxy/:service", any(access::check_root))
        .route("/proxy/:service/", any(access::check_root))
        .route("/proxy/:service/*path", any(access::check))
        // Diagnostics
        .route("/admin/gateway-groups", get(admin::gateway_groups))
        .route(
            "/admin/whitelist",
            get(admin::whitelist).put(admin::update_whitelist),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
