use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Referral;
use crate::error::AppError;
use crate::services::Outcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReferralRequest {
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
}

pub async fn create_referral(
    State(state): State<AppState>,
    Json(payload): Json<CreateReferralRequest>,
) -> Result<(StatusCode, Json<Outcome<Referral>>), AppError> {
    let outcome = state
        .referrals
        .create_referral(payload.referrer_id, payload.referee_id)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, AppError> {
    Ok(Json(state.referrals.get_referral(id).await?))
}

/// Qualification signal; safe to deliver more than once.
pub async fn complete_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Outcome<Referral>>, AppError> {
    Ok(Json(state.referrals.mark_completed(id).await?))
}

pub async fn list_user_referrals(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Referral>>, AppError> {
    Ok(Json(state.referrals.list_referrals(user_id).await?))
}

pub async fn credit_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Outcome<Referral>>, AppError> {
    Ok(Json(state.rewards.credit_referral(id).await?))
}
