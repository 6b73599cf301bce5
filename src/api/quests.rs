//! Quest endpoints
//!
//! Endpoints:
//!   POST /quests/progress -> Report a user action against active quests
//!   GET  /quests -> List quest definitions

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::quests::{CompletedQuest, QuestAction, QuestDefinition, QuestEngine};

#[derive(Clone)]
pub struct QuestApiState {
    pub quests: Arc<QuestEngine>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub action: QuestAction,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub completed: Vec<CompletedQuest>,
}

#[derive(Debug, Serialize)]
pub struct QuestListResponse {
    pub quests: Vec<QuestDefinition>,
}

pub fn create_router(state: QuestApiState) -> Router {
    Router::new()
        .route("/quests/progress", post(report_progress))
        .route("/quests", get(list_quests))
        .with_state(state)
}

/// POST /quests/progress - record an action, returning new completions
pub async fn report_progress(
    State(state): State<QuestApiState>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, (StatusCode, String)> {
    state
        .quests
        .process_progress(&req.user_id, &req.action)
        .await
        .map(|completed| Json(ProgressResponse { completed }))
        .map_err(error_response)
}

/// GET /quests - all quest definitions, active and retired
pub async fn list_quests(
    State(state): State<QuestApiState>,
) -> Result<Json<QuestListResponse>, (StatusCode, String)> {
    state
        .quests
        .list_quests()
        .await
        .map(|quests| Json(QuestListResponse { quests }))
        .map_err(error_response)
}
