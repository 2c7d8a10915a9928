use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{ReferralSettings, SettingsUpdate, TransactionKind};
use crate::error::AppError;
use crate::ports::{LedgerStats, Posting};
use crate::services::WalletAudit;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub amount: BigDecimal,
    pub description: String,
    /// One of `credit`, `bonus`, `refund`; defaults to `bonus`.
    #[serde(default = "default_grant_kind")]
    pub kind: TransactionKind,
}

fn default_grant_kind() -> TransactionKind {
    TransactionKind::Bonus
}

pub async fn grant_bonus(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantRequest>,
) -> Result<(StatusCode, Json<Posting>), AppError> {
    let posting = state
        .ledger
        .grant(user_id, payload.kind, payload.amount, &payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

pub async fn audit_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<WalletAudit>, AppError> {
    Ok(Json(state.ledger.audit_wallet(user_id).await?))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<LedgerStats>, AppError> {
    Ok(Json(state.ledger.stats().await?))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<ReferralSettings> {
    Json(state.settings.snapshot().as_ref().clone())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ReferralSettings>, AppError> {
    let saved = state.settings.update(update).await?;
    Ok(Json(saved.as_ref().clone()))
}
