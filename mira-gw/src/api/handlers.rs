//! HTTP request handlers
//!
//! Producer dispatch endpoints plus the operational query surface. Dispatch
//! endpoints are fire-and-forget: they return 202 with the attempted
//! delivery count, and an offline target is a count of zero, never an error.

use crate::api::server::AppContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mira_common::events::NotificationPayload;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub user_id: Uuid,
    pub payload: NotificationPayload,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub payload: NotificationPayload,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivered: usize,
}

#[derive(Debug, Serialize)]
pub struct OnlineResponse {
    pub user_id: Uuid,
    pub online: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub online_users: usize,
    pub connections: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - service health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mira-gw".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /notify - push a payload to every open connection of one user
pub async fn notify(
    State(ctx): State<AppContext>,
    Json(req): Json<NotifyRequest>,
) -> (StatusCode, Json<DeliveryResponse>) {
    let delivered = ctx.dispatcher.send_to_user(req.user_id, req.payload);
    info!(user_id = %req.user_id, delivered, "notify request dispatched");
    (StatusCode::ACCEPTED, Json(DeliveryResponse { delivered }))
}

/// POST /broadcast - push a payload to every registered connection
pub async fn broadcast(
    State(ctx): State<AppContext>,
    Json(req): Json<BroadcastRequest>,
) -> (StatusCode, Json<DeliveryResponse>) {
    let delivered = ctx.dispatcher.broadcast(req.payload);
    info!(delivered, "broadcast request dispatched");
    (StatusCode::ACCEPTED, Json(DeliveryResponse { delivered }))
}

/// GET /online/:user_id - whether the user has at least one open connection
pub async fn online(
    State(ctx): State<AppContext>,
    Path(user_id): Path<Uuid>,
) -> Json<OnlineResponse> {
    Json(OnlineResponse {
        user_id,
        online: ctx.registry.is_online(user_id),
    })
}

/// GET /stats - registry counters for operational tooling
pub async fn stats(State(ctx): State<AppContext>) -> Json<StatsResponse> {
    Json(StatsResponse {
        online_users: ctx.registry.count_online_users(),
        connections: ctx.registry.count_connections(),
    })
}
