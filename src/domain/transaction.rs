//! Ledger transaction entity.
//! Transactions are immutable once written; the log of them is the audit
//! trail for how every wallet balance was reached.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Bonus,
    Refund,
    WithdrawalReserve,
    WithdrawalComplete,
    WithdrawalRelease,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 6] = [
        TransactionKind::Credit,
        TransactionKind::Bonus,
        TransactionKind::Refund,
        TransactionKind::WithdrawalReserve,
        TransactionKind::WithdrawalComplete,
        TransactionKind::WithdrawalRelease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Bonus => "bonus",
            TransactionKind::Refund => "refund",
            TransactionKind::WithdrawalReserve => "withdrawal_reserve",
            TransactionKind::WithdrawalComplete => "withdrawal_complete",
            TransactionKind::WithdrawalRelease => "withdrawal_release",
        }
    }

    /// Kinds that add spendable money rather than moving reserved funds.
    pub fn is_inflow(&self) -> bool {
        matches!(
            self,
            TransactionKind::Credit | TransactionKind::Bonus | TransactionKind::Refund
        )
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LedgerError::Storage(format!("unknown transaction kind '{}'", s)))
    }
}

/// Domain entity representing one ledger movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: BigDecimal,
    pub description: String,
    pub related_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A movement waiting to be appended to the ledger.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: BigDecimal,
    pub related_entity_id: Option<Uuid>,
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        user_id: Uuid,
        kind: TransactionKind,
        amount: BigDecimal,
        related_entity_id: Option<Uuid>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            amount,
            related_entity_id,
            description: description.into(),
        }
    }

    pub fn into_transaction(self, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            related_entity_id: self.related_entity_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_text_form_matches_serde() {
        for kind in TransactionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!("chargeback".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_inflow_kinds() {
        assert!(TransactionKind::Bonus.is_inflow());
        assert!(!TransactionKind::WithdrawalRelease.is_inflow());
    }
}
