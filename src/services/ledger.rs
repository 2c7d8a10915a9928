use bigdecimal::BigDecimal;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewTransaction, Transaction, TransactionKind, Wallet};
use crate::error::LedgerError;
use crate::ports::{LedgerRepository, LedgerStats, Posting};
use crate::validation::{sanitize_string, validate_amount, validate_max_len, validate_required, DESCRIPTION_MAX_LEN};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;
const RECONCILE_CONCURRENCY: usize = 8;

/// Cached wallet compared against the wallet rebuilt from its transaction log.
#[derive(Debug, Clone, Serialize)]
pub struct WalletAudit {
    pub user_id: Uuid,
    pub cached: Wallet,
    pub replayed: Wallet,
    pub transaction_count: usize,
    pub consistent: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub checked: usize,
    pub mismatches: Vec<WalletAudit>,
}

/// Read side of the ledger plus the single entry point for direct postings.
#[derive(Clone)]
pub struct LedgerService {
    repository: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    pub async fn append_transaction(
        &self,
        user_id: Uuid,
        kind: TransactionKind,
        amount: BigDecimal,
        related_entity_id: Option<Uuid>,
        description: &str,
    ) -> Result<Posting, LedgerError> {
        validate_amount("amount", &amount)?;
        let description = sanitize_string(description);
        validate_required("description", &description)?;
        validate_max_len("description", &description, DESCRIPTION_MAX_LEN)?;

        let posting = self
            .repository
            .append_transaction(NewTransaction::new(
                user_id,
                kind,
                amount,
                related_entity_id,
                description,
            ))
            .await?;

        tracing::info!(
            user_id = %user_id,
            transaction_id = %posting.transaction.id,
            kind = %kind,
            amount = %posting.transaction.amount,
            available_balance = %posting.wallet.available_balance,
            "Ledger transaction appended"
        );
        Ok(posting)
    }

    /// Manual inflow by an admin. Withdrawal kinds belong to the workflow.
    pub async fn grant(
        &self,
        user_id: Uuid,
        kind: TransactionKind,
        amount: BigDecimal,
        description: &str,
    ) -> Result<Posting, LedgerError> {
        if !kind.is_inflow() {
            return Err(LedgerError::Validation(format!(
                "kind must be one of credit, bonus, refund; got {}",
                kind
            )));
        }
        self.append_transaction(user_id, kind, amount, None, description)
            .await
    }

    pub async fn get_wallet(&self, user_id: Uuid) -> Result<Wallet, LedgerError> {
        self.repository.get_wallet(user_id).await
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        self.repository
            .list_transactions(user_id, limit, offset)
            .await
    }

    /// Every transaction of the user, oldest first.
    pub async fn full_history(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.repository.wallet_log(user_id).await?.transactions)
    }

    pub async fn audit_wallet(&self, user_id: Uuid) -> Result<WalletAudit, LedgerError> {
        let log = self.repository.wallet_log(user_id).await?;
        let replayed = Wallet::replay(user_id, &log.transactions);

        let (replayed, replay_ok) = match replayed {
            Ok(wallet) => (wallet, true),
            Err(e) => {
                tracing::error!(user_id = %user_id, "Transaction log does not replay: {}", e);
                (Wallet::empty(user_id), false)
            }
        };

        let consistent = replay_ok
            && log.wallet.is_reconciled()
            && log.wallet.same_balances(&replayed);
        if !consistent {
            tracing::warn!(
                user_id = %user_id,
                cached_available = %log.wallet.available_balance,
                replayed_available = %replayed.available_balance,
                "Wallet does not reconcile with its transaction log"
            );
        }

        Ok(WalletAudit {
            user_id,
            cached: log.wallet,
            replayed,
            transaction_count: log.transactions.len(),
            consistent,
        })
    }

    pub async fn reconcile_all(&self) -> Result<ReconciliationReport, LedgerError> {
        let owners = self.repository.list_wallet_owners().await?;
        let audits: Vec<WalletAudit> = stream::iter(owners)
            .map(|user_id| self.audit_wallet(user_id))
            .buffer_unordered(RECONCILE_CONCURRENCY)
            .try_collect()
            .await?;

        let report = ReconciliationReport {
            checked: audits.len(),
            mismatches: audits.into_iter().filter(|audit| !audit.consistent).collect(),
        };

        tracing::info!(
            checked = report.checked,
            mismatches = report.mismatches.len(),
            "Wallet reconciliation finished"
        );
        Ok(report)
    }

    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        self.repository.stats().await
    }

    pub async fn ping(&self) -> Result<(), LedgerError> {
        self.repository.ping().await
    }
}
