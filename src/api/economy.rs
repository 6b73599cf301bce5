//! Economy endpoints
//!
//! Endpoints:
//!   POST /events/message -> Award message points (60s cooldown)
//!   POST /events/voice -> Award voice interval points
//!   POST /economy/daily -> Claim the daily bonus
//!   POST /economy/convert -> Convert points to XP
//!   GET  /economy/balance/:user_id -> Read an account
//!   POST /economy/buy -> Purchase a shop item
//!   POST /economy/use -> Use an owned item
//!   GET  /economy/inventory/:user_id -> Unused inventory grouped by item

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::economy::{Conversion, DailyClaim, LedgerEngine, MessageAward, UserAccount, VoiceAward};
use crate::shop::{InventoryLine, PurchaseOutcome, ShopEngine, UseOutcome, CATALOG};

#[derive(Clone)]
pub struct EconomyApiState {
    pub ledger: Arc<LedgerEngine>,
    pub shop: Arc<ShopEngine>,
}

#[derive(Debug, Deserialize)]
pub struct MessageEventRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceEventRequest {
    pub user_id: String,
    pub duration_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct DailyRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub user_id: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: String,
    pub item_id: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub items: Vec<crate::shop::ShopItem>,
}

pub fn create_router(state: EconomyApiState) -> Router {
    Router::new()
        .route("/events/message", post(message_event))
        .route("/events/voice", post(voice_event))
        .route("/economy/daily", post(claim_daily))
        .route("/economy/convert", post(convert))
        .route("/economy/balance/:user_id", get(balance))
        .route("/economy/shop", get(catalog))
        .route("/economy/buy", post(buy))
        .route("/economy/use", post(use_item))
        .route("/economy/inventory/:user_id", get(inventory))
        .with_state(state)
}

/// POST /events/message - award points for a chat message
pub async fn message_event(
    State(state): State<EconomyApiState>,
    Json(req): Json<MessageEventRequest>,
) -> Result<Json<MessageAward>, (StatusCode, String)> {
    state
        .ledger
        .award_message_points(&req.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /events/voice - award points for voice presence
pub async fn voice_event(
    State(state): State<EconomyApiState>,
    Json(req): Json<VoiceEventRequest>,
) -> Result<Json<VoiceAward>, (StatusCode, String)> {
    state
        .ledger
        .award_voice_points(&req.user_id, req.duration_seconds)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /economy/daily - claim the daily streak bonus
pub async fn claim_daily(
    State(state): State<EconomyApiState>,
    Json(req): Json<DailyRequest>,
) -> Result<Json<DailyClaim>, (StatusCode, String)> {
    state
        .ledger
        .claim_daily(&req.user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /economy/convert - convert points to XP
pub async fn convert(
    State(state): State<EconomyApiState>,
    Json(req): Json<ConvertRequest>,
) -> Result<Json<Conversion>, (StatusCode, String)> {
    state
        .ledger
        .convert_points_to_xp(&req.user_id, req.amount)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /economy/balance/:user_id - read a full account
pub async fn balance(
    State(state): State<EconomyApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserAccount>, (StatusCode, String)> {
    state
        .ledger
        .account(&user_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /economy/shop - the fixed item catalog
pub async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        items: CATALOG.to_vec(),
    })
}

/// POST /economy/buy - purchase an item
pub async fn buy(
    State(state): State<EconomyApiState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<PurchaseOutcome>, (StatusCode, String)> {
    state
        .shop
        .buy(&req.user_id, &req.item_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /economy/use - use an owned item
pub async fn use_item(
    State(state): State<EconomyApiState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<UseOutcome>, (StatusCode, String)> {
    state
        .shop
        .use_item(&req.user_id, &req.item_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /economy/inventory/:user_id - unused inventory
pub async fn inventory(
    State(state): State<EconomyApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<InventoryLine>>, (StatusCode, String)> {
    state
        .shop
        .inventory(&user_id)
        .await
        .map(Json)
        .map_err(error_response)
}
