use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

/// SQLSTATE codes Postgres raises when a row lock cannot be taken in time or
/// a transaction loses a concurrency race.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Error taxonomy of the ledger core.
///
/// Idempotency short-circuits (already credited, already processed, ...) are
/// not represented here: they are successful outcomes that performed no write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient funds for user {user_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        user_id: uuid::Uuid,
        requested: BigDecimal,
        available: BigDecimal,
    },

    #[error("minimum withdrawal is {minimum}, requested {requested}")]
    BelowMinimum {
        requested: BigDecimal,
        minimum: BigDecimal,
    },

    #[error("cannot {action} a {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: String,
    },

    #[error("invalid referral pair: {0}")]
    InvalidReferralPair(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("ledger busy: {0}")]
    Busy(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code collaborators branch on.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::BelowMinimum { .. } => "below_minimum",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
            LedgerError::InvalidReferralPair(_) => "invalid_referral_pair",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::Busy(_) => "busy",
            LedgerError::Validation(_) => "validation",
            LedgerError::Storage(_) => "storage",
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(LOCK_NOT_AVAILABLE) | Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    LedgerError::Busy(db_err.message().to_string())
                }
                _ => LedgerError::Storage(err.to_string()),
            },
            sqlx::Error::PoolTimedOut => {
                LedgerError::Busy("timed out waiting for a database connection".to_string())
            }
            _ => LedgerError::Storage(err.to_string()),
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Ledger(err.into())
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Ledger(err) => match err {
                LedgerError::InsufficientFunds { .. }
                | LedgerError::BelowMinimum { .. }
                | LedgerError::InvalidReferralPair(_) => StatusCode::UNPROCESSABLE_ENTITY,
                LedgerError::InvalidTransition { .. } => StatusCode::CONFLICT,
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
                LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
                LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(err) => err.code(),
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
            "status": status.as_u16(),
        }));

        let mut response = (status, body).into_response();
        if matches!(self, AppError::Ledger(LedgerError::Busy(_))) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
