//! Per-user wallet aggregate.
//! A wallet is never edited directly: it only changes by folding ledger
//! transactions into it through [`Wallet::apply`].

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::{Transaction, TransactionKind};
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: Uuid,
    pub available_balance: BigDecimal,
    pub pending_withdrawal: BigDecimal,
    pub total_earned: BigDecimal,
    pub total_withdrawn: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Zeroed wallet, the state every user starts from before their first transaction.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            available_balance: BigDecimal::zero(),
            pending_withdrawal: BigDecimal::zero(),
            total_earned: BigDecimal::zero(),
            total_withdrawn: BigDecimal::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Returns the wallet that results from applying one movement of `kind`.
    ///
    /// Fails with `InsufficientFunds` when the movement would drive
    /// `available_balance` or `pending_withdrawal` below zero; `self` is left
    /// untouched either way.
    pub fn apply(
        &self,
        kind: TransactionKind,
        amount: &BigDecimal,
        at: DateTime<Utc>,
    ) -> Result<Wallet, LedgerError> {
        if amount <= &BigDecimal::zero() {
            return Err(LedgerError::Validation(format!(
                "transaction amount must be positive, got {}",
                amount
            )));
        }

        let mut next = self.clone();
        match kind {
            TransactionKind::Credit | TransactionKind::Bonus | TransactionKind::Refund => {
                next.available_balance += amount;
                next.total_earned += amount;
            }
            TransactionKind::WithdrawalReserve => {
                self.ensure_covers(&self.available_balance, amount)?;
                next.available_balance -= amount;
                next.pending_withdrawal += amount;
            }
            TransactionKind::WithdrawalComplete => {
                self.ensure_covers(&self.pending_withdrawal, amount)?;
                next.pending_withdrawal -= amount;
                next.total_withdrawn += amount;
            }
            TransactionKind::WithdrawalRelease => {
                self.ensure_covers(&self.pending_withdrawal, amount)?;
                next.pending_withdrawal -= amount;
                next.available_balance += amount;
            }
        }
        next.updated_at = at;
        Ok(next)
    }

    fn ensure_covers(&self, bucket: &BigDecimal, amount: &BigDecimal) -> Result<(), LedgerError> {
        if bucket < amount {
            return Err(LedgerError::InsufficientFunds {
                user_id: self.user_id,
                requested: amount.clone(),
                available: bucket.clone(),
            });
        }
        Ok(())
    }

    /// Rebuilds a wallet from its full transaction log, oldest first.
    pub fn replay<'a, I>(user_id: Uuid, transactions: I) -> Result<Wallet, LedgerError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .try_fold(Wallet::empty(user_id), |wallet, tx| {
                wallet.apply(tx.kind, &tx.amount, tx.created_at)
            })
    }

    /// `total_earned - total_withdrawn - pending_withdrawal == available_balance`
    /// with both spendable buckets non-negative.
    pub fn is_reconciled(&self) -> bool {
        let zero = BigDecimal::zero();
        self.available_balance >= zero
            && self.pending_withdrawal >= zero
            && &self.total_earned - &self.total_withdrawn - &self.pending_withdrawal
                == self.available_balance
    }

    /// Compares balances only; `updated_at` is bookkeeping.
    pub fn same_balances(&self, other: &Wallet) -> bool {
        self.available_balance == other.available_balance
            && self.pending_withdrawal == other.pending_withdrawal
            && self.total_earned == other.total_earned
            && self.total_withdrawn == other.total_withdrawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    fn funded(value: i64) -> Wallet {
        Wallet::empty(Uuid::new_v4())
            .apply(TransactionKind::Credit, &amount(value), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_credit_increases_available_and_earned() {
        let wallet = funded(500);
        assert_eq!(wallet.available_balance, amount(500));
        assert_eq!(wallet.total_earned, amount(500));
        assert!(wallet.is_reconciled());
    }

    #[test]
    fn test_reserve_moves_funds_to_pending() {
        let wallet = funded(500)
            .apply(TransactionKind::WithdrawalReserve, &amount(200), Utc::now())
            .unwrap();
        assert_eq!(wallet.available_balance, amount(300));
        assert_eq!(wallet.pending_withdrawal, amount(200));
        assert!(wallet.is_reconciled());
    }

    #[test]
    fn test_reserve_beyond_available_is_rejected() {
        let wallet = funded(500);
        let err = wallet
            .apply(TransactionKind::WithdrawalReserve, &amount(600), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(wallet.available_balance, amount(500));
    }

    #[test]
    fn test_complete_realizes_debit_without_touching_available() {
        let wallet = funded(500)
            .apply(TransactionKind::WithdrawalReserve, &amount(100), Utc::now())
            .unwrap()
            .apply(TransactionKind::WithdrawalComplete, &amount(100), Utc::now())
            .unwrap();
        assert_eq!(wallet.available_balance, amount(400));
        assert_eq!(wallet.pending_withdrawal, amount(0));
        assert_eq!(wallet.total_withdrawn, amount(100));
        assert!(wallet.is_reconciled());
    }

    #[test]
    fn test_release_restores_pre_request_state() {
        let before = funded(500);
        let after = before
            .apply(TransactionKind::WithdrawalReserve, &amount(200), Utc::now())
            .unwrap()
            .apply(TransactionKind::WithdrawalRelease, &amount(200), Utc::now())
            .unwrap();
        assert!(after.same_balances(&before));
    }

    #[test]
    fn test_release_without_reservation_is_rejected() {
        let err = funded(500)
            .apply(TransactionKind::WithdrawalRelease, &amount(1), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let err = funded(10)
            .apply(TransactionKind::Bonus, &amount(0), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_unbalanced_wallet_is_not_reconciled() {
        let mut wallet = funded(100);
        wallet.available_balance = amount(90);
        assert!(!wallet.is_reconciled());
    }
}
