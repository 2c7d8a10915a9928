use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{PaymentMethod, WithdrawalRequest, WithdrawalStatus};
use crate::error::AppError;
use crate::services::Outcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub admin_id: Uuid,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WithdrawalQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(payload): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<Outcome<WithdrawalRequest>>), AppError> {
    let outcome = state
        .withdrawals
        .request_withdrawal(
            payload.user_id,
            payload.amount,
            payload.method,
            &payload.details,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalRequest>, AppError> {
    Ok(Json(state.withdrawals.get_withdrawal(id).await?))
}

pub async fn list_user_withdrawals(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WithdrawalRequest>>, AppError> {
    Ok(Json(state.withdrawals.list_for_user(user_id).await?))
}

/// Admin queue, optionally filtered by `?status=`.
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalQuery>,
) -> Result<Json<Vec<WithdrawalRequest>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<WithdrawalStatus>)
        .transpose()?;
    let requests = state
        .withdrawals
        .list_withdrawals(status, query.limit, query.offset)
        .await?;
    Ok(Json(requests))
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<Outcome<WithdrawalRequest>>, AppError> {
    let outcome = state
        .withdrawals
        .approve(id, payload.admin_id, payload.note.as_deref())
        .await?;
    Ok(Json(outcome))
}

pub async fn process_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<Outcome<WithdrawalRequest>>, AppError> {
    let outcome = state
        .withdrawals
        .process(id, payload.admin_id, payload.note.as_deref())
        .await?;
    Ok(Json(outcome))
}

pub async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<Outcome<WithdrawalRequest>>, AppError> {
    let note = payload.note.unwrap_or_default();
    let outcome = state
        .withdrawals
        .reject(id, payload.admin_id, &note)
        .await?;
    Ok(Json(outcome))
}
