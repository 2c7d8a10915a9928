use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use csv::Writer;
use serde::Serialize;
use uuid::Uuid;

use super::Pagination;
use crate::domain::{Transaction, Wallet};
use crate::error::AppError;
use crate::AppState;

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Wallet>, AppError> {
    Ok(Json(state.ledger.get_wallet(user_id).await?))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions = state
        .ledger
        .history(user_id, page.limit, page.offset)
        .await?;
    Ok(Json(transactions))
}

/// CSV row; amounts and timestamps are rendered as strings.
#[derive(Serialize)]
struct TransactionCsvRow {
    id: String,
    created_at: String,
    kind: &'static str,
    amount: String,
    description: String,
    related_entity_id: String,
}

impl From<&Transaction> for TransactionCsvRow {
    fn from(tx: &Transaction) -> Self {
        TransactionCsvRow {
            id: tx.id.to_string(),
            created_at: tx.created_at.to_rfc3339(),
            kind: tx.kind.as_str(),
            amount: tx.amount.to_string(),
            description: tx.description.clone(),
            related_entity_id: tx
                .related_entity_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Full transaction history of one user as CSV, oldest first.
pub async fn export_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.ledger.full_history(user_id).await?;

    let mut writer = Writer::from_writer(Vec::new());
    for tx in &transactions {
        writer
            .serialize(TransactionCsvRow::from(tx))
            .map_err(|e| AppError::Internal(format!("failed to write CSV row: {}", e)))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("failed to flush CSV: {}", e)))?;

    tracing::info!(user_id = %user_id, rows = transactions.len(), "Transaction history exported");

    let disposition = format!("attachment; filename=\"transactions-{}.csv\"", user_id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
