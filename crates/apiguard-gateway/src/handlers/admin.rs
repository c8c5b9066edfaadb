//! Read-only diagnostics for the routing mirror, plus white list updates.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use apiguard_control::{ApiId, GatewayGroup, GroupId};

use crate::error::ApiError;
use crate::state::GatewayState;

/// One app's gateway group and the rule ids it exposes per service.
#[derive(Debug, Serialize)]
pub struct GroupView {
    /// The gateway group id.
    pub group: GroupId,
    /// Rule ids by service, sorted.
    pub services: BTreeMap<String, Vec<ApiId>>,
}

impl GroupView {
    fn from_group(group: &GatewayGroup) -> Self {
        let services = group
            .services()
            .map(|(service, sc)| {
                let mut ids: Vec<ApiId> = sc.api_configs().map(|ac| ac.id).collect();
                ids.sort_unstable();
                (service.to_string(), ids)
            })
            .collect();
        Self {
            group: group.id(),
            services,
        }
    }
}

/// The current service white list.
#[derive(Debug, Serialize)]
pub struct WhitelistView {
    /// Open services, sorted.
    pub services: Vec<String>,
}

/// A new white list source value.
#[derive(Debug, Deserialize)]
pub struct WhitelistUpdate {
    /// Comma-separated service ids.
    pub services: String,
}

/// List every app's gateway group from one routing snapshot.
///
/// ```text
/// GET /admin/gateway-groups
///
/// Response: 200 OK
/// { "partnerX": { "group": "a", "services": { "orders": [1, 2] } } }
/// ```
pub async fn gateway_groups(State(state): State<GatewayState>) -> impl IntoResponse {
    let table = state.index.snapshot();
    let view: BTreeMap<String, GroupView> = table
        .app_groups()
        .map(|(app, group)| (app.to_string(), GroupView::from_group(group)))
        .collect();

    (StatusCode::OK, Json(view))
}

/// Show the current service white list.
pub async fn whitelist(State(state): State<GatewayState>) -> impl IntoResponse {
    let mut services: Vec<String> = state.whitelist.snapshot().iter().cloned().collect();
    services.sort_unstable();

    (StatusCode::OK, Json(WhitelistView { services }))
}

/// Replace the white list source value.
///
/// The rebuild happens on the watcher task; the response only acknowledges
/// that the new value was published.
///
/// # Errors
///
/// Returns `ApiError::Unavailable` if the watcher task has stopped.
pub async fn update_whitelist(
    State(state): State<GatewayState>,
    Json(update): Json<WhitelistUpdate>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(services = %update.services, "White list update requested");
    state
        .whitelist_source
        .send(update.services)
        .map_err(|_| ApiError::Unavailable("white list watcher stopped".to_string()))?;
    Ok(StatusCode::ACCEPTED)
}
