use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionKind;
use super::Transition;
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "upi",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upi" => Ok(PaymentMethod::Upi),
            "bank" => Ok(PaymentMethod::Bank),
            other => Err(LedgerError::Storage(format!(
                "unknown payment method '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Processed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalAction {
    Approve,
    Process,
    Reject,
}

impl WithdrawalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalAction::Approve => "approve",
            WithdrawalAction::Process => "process",
            WithdrawalAction::Reject => "reject",
        }
    }

    /// Ledger movement that accompanies the transition, if any. Approval is
    /// bookkeeping only: the funds stay reserved.
    pub fn ledger_effect(&self) -> Option<TransactionKind> {
        match self {
            WithdrawalAction::Approve => None,
            WithdrawalAction::Process => Some(TransactionKind::WithdrawalComplete),
            WithdrawalAction::Reject => Some(TransactionKind::WithdrawalRelease),
        }
    }
}

impl fmt::Display for WithdrawalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 4] = [
        WithdrawalStatus::Pending,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Processed,
        WithdrawalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Processed => "processed",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    /// The withdrawal transition table: `pending -> approved -> processed`
    /// or `pending -> rejected`. Repeating `process` or `reject` on a request
    /// already in that terminal state is a no-op.
    pub fn apply(
        self,
        action: WithdrawalAction,
    ) -> Result<Transition<WithdrawalStatus>, LedgerError> {
        use WithdrawalAction::*;
        use WithdrawalStatus::*;

        match (self, action) {
            (Pending, Approve) => Ok(Transition::Advance(Approved)),
            (Approved, Process) => Ok(Transition::Advance(Processed)),
            (Pending, Reject) => Ok(Transition::Advance(Rejected)),
            (Processed, Process) | (Rejected, Reject) => Ok(Transition::AlreadyApplied),
            (from, action) => Err(LedgerError::InvalidTransition {
                entity: "withdrawal request",
                from: from.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WithdrawalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::Validation(format!("unknown withdrawal status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    /// Method-specific payout details, stored as given.
    pub details: serde_json::Value,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    pub decided_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn new(
        user_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            method,
            details,
            status: WithdrawalStatus::Pending,
            admin_note: None,
            decided_by: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    /// Applies an admin decision. The existing note is kept when the action
    /// carries none.
    pub fn decide(
        &self,
        action: WithdrawalAction,
        admin_id: Uuid,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Transition<WithdrawalRequest>, LedgerError> {
        match self.status.apply(action)? {
            Transition::AlreadyApplied => Ok(Transition::AlreadyApplied),
            Transition::Advance(status) => {
                let mut next = self.clone();
                next.status = status;
                next.decided_by = Some(admin_id);
                next.decided_at = Some(at);
                if let Some(note) = note {
                    next.admin_note = Some(note.to_string());
                }
                Ok(Transition::Advance(next))
            }
        }
    }
}
