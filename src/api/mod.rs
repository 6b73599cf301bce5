//! HTTP API for the engagement core.
//!
//! Thin 1:1 mapping of core operations onto REST endpoints:
//! - Economy (message/voice events, daily bonus, conversion, shop)
//! - Quests (progress reporting, definition listing)
//! - Admin (audit events, lockdown transitions, quest management)
//!
//! Handlers validate nothing beyond deserialization and carry no decision
//! logic; every rule lives in the engines.

pub mod admin;
pub mod economy;
pub mod quests;

pub use admin::{create_router as create_admin_router, AdminApiState};
pub use economy::{create_router as create_economy_router, EconomyApiState};
pub use quests::{create_router as create_quest_router, QuestApiState};

use axum::http::StatusCode;

use crate::error::CoreError;

/// Map core errors onto HTTP status codes.
pub(crate) fn error_response(err: CoreError) -> (StatusCode, String) {
    let status = match &err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::InsufficientFunds { .. }
        | CoreError::ItemNotOwned(_)
        | CoreError::Conflict => StatusCode::CONFLICT,
        CoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, err.to_string())
}
