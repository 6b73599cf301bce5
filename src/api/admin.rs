//! Admin and audit endpoints
//!
//! Endpoints:
//!   POST /events/audit -> Feed one privileged action to the detector
//!   POST /admin/lockdown -> Manually activate the lockdown
//!   POST /admin/unlock -> Manually lift the lockdown
//!   GET  /admin/lockdown -> Current lockdown state
//!   GET  /admin/audit -> Recent audit entries
//!   POST /admin/quests -> Create a quest
//!   POST /admin/quests/:quest_id/deactivate -> Retire a quest
//!
//! Capability gating (who is allowed to call these) happens upstream; the
//! caller arrives pre-verified.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::antinuke::{AdminAction, AntiNukeDetector, AuditEvent, CheckOutcome, LockdownState};
use crate::api::error_response;
use crate::quests::{NewQuest, QuestDefinition, QuestEngine};
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AdminApiState {
    pub detector: Arc<AntiNukeDetector>,
    pub quests: Arc<QuestEngine>,
    pub store: Arc<MemoryStore>,
}

#[derive(Debug, Deserialize)]
pub struct AuditEventRequest {
    pub user_id: String,
    pub action: AdminAction,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Deserialize)]
pub struct LockdownRequest {
    pub reason: String,
    pub initiated_by: String,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub initiated_by: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditEvent>,
}

pub fn create_router(state: AdminApiState) -> Router {
    Router::new()
        .route("/events/audit", post(audit_event))
        .route("/admin/lockdown", post(activate_lockdown))
        .route("/admin/lockdown", get(lockdown_status))
        .route("/admin/unlock", post(lift_lockdown))
        .route("/admin/audit", get(recent_audit))
        .route("/admin/quests", post(create_quest))
        .route("/admin/quests/:quest_id/deactivate", post(deactivate_quest))
        .with_state(state)
}

/// POST /events/audit - run one privileged action through the detector
pub async fn audit_event(
    State(state): State<AdminApiState>,
    Json(req): Json<AuditEventRequest>,
) -> Result<Json<CheckOutcome>, (StatusCode, String)> {
    state
        .detector
        .check_action(&req.user_id, req.action, &req.details)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /admin/lockdown - manual lockdown
pub async fn activate_lockdown(
    State(state): State<AdminApiState>,
    Json(req): Json<LockdownRequest>,
) -> Result<Json<LockdownState>, (StatusCode, String)> {
    state
        .detector
        .lockdown(&req.reason, &req.initiated_by)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /admin/lockdown - current state
pub async fn lockdown_status(
    State(state): State<AdminApiState>,
) -> Result<Json<LockdownState>, (StatusCode, String)> {
    state.detector.status().await.map(Json).map_err(error_response)
}

/// POST /admin/unlock - lift the lockdown
pub async fn lift_lockdown(
    State(state): State<AdminApiState>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<LockdownState>, (StatusCode, String)> {
    state
        .detector
        .unlock(&req.initiated_by)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /admin/audit - newest audit entries first
pub async fn recent_audit(
    State(state): State<AdminApiState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<AuditLogResponse>, (StatusCode, String)> {
    state
        .store
        .recent_audit(query.limit.unwrap_or(50))
        .await
        .map(|entries| Json(AuditLogResponse { entries }))
        .map_err(error_response)
}

/// POST /admin/quests - create a quest definition
pub async fn create_quest(
    State(state): State<AdminApiState>,
    Json(req): Json<NewQuest>,
) -> Result<Json<QuestDefinition>, (StatusCode, String)> {
    state
        .quests
        .create_quest(req)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /admin/quests/:quest_id/deactivate - retire a quest
pub async fn deactivate_quest(
    State(state): State<AdminApiState>,
    Path(quest_id): Path<String>,
) -> Result<Json<QuestDefinition>, (StatusCode, String)> {
    state
        .quests
        .deactivate_quest(&quest_id)
        .await
        .map(Json)
        .map_err(error_response)
}
