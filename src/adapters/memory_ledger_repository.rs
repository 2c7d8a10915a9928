//! In-memory implementation of the ledger ports.
//!
//! Each user's wallet and transaction log sit behind their own async mutex,
//! so mutations for one user are serialized while different users proceed in
//! parallel. Entity maps are only write-locked after the user lock is held,
//! and every fallible step runs before the first write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::domain::{
    NewTransaction, Referral, ReferralSettings, RewardQuote, Transaction, TransactionKind,
    Transition, Wallet, WithdrawalAction, WithdrawalRequest, WithdrawalStatus,
};
use crate::error::LedgerError;
use crate::ports::{
    CompletionOutcome, CreditOutcome, DecisionOutcome, LedgerRepository, LedgerStats, Posting,
    RepositoryResult, SettingsRepository, StatusTotals, WalletLog,
};

struct UserLedger {
    wallet: Wallet,
    transactions: Vec<Transaction>,
}

impl UserLedger {
    /// Computes the effect of `entry` without touching the ledger. Called with
    /// the user lock held, so stamps follow the order of the log.
    fn stage(&self, entry: NewTransaction) -> Result<(Wallet, Transaction), LedgerError> {
        let at = Utc::now();
        let wallet = self.wallet.apply(entry.kind, &entry.amount, at)?;
        Ok((wallet, entry.into_transaction(at)))
    }

    fn commit(&mut self, wallet: Wallet, transaction: Transaction) -> Posting {
        self.wallet = wallet;
        self.transactions.push(transaction.clone());
        Posting {
            transaction,
            wallet: self.wallet.clone(),
        }
    }
}

pub struct InMemoryLedgerRepository {
    lock_timeout: Duration,
    ledgers: RwLock<HashMap<Uuid, Arc<Mutex<UserLedger>>>>,
    referrals: RwLock<HashMap<Uuid, Referral>>,
    withdrawals: RwLock<HashMap<Uuid, WithdrawalRequest>>,
    settings: RwLock<Option<ReferralSettings>>,
}

impl InMemoryLedgerRepository {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            lock_timeout,
            ledgers: RwLock::new(HashMap::new()),
            referrals: RwLock::new(HashMap::new()),
            withdrawals: RwLock::new(HashMap::new()),
            settings: RwLock::new(None),
        }
    }

    async fn ledger_for(&self, user_id: Uuid) -> Arc<Mutex<UserLedger>> {
        if let Some(ledger) = self.ledgers.read().await.get(&user_id) {
            return ledger.clone();
        }
        self.ledgers
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(UserLedger {
                    wallet: Wallet::empty(user_id),
                    transactions: Vec::new(),
                }))
            })
            .clone()
    }

    async fn lock_user(&self, user_id: Uuid) -> RepositoryResult<OwnedMutexGuard<UserLedger>> {
        let ledger = self.ledger_for(user_id).await;
        tokio::time::timeout(self.lock_timeout, ledger.lock_owned())
            .await
            .map_err(|_| {
                LedgerError::Busy(format!(
                    "timed out waiting for the wallet lock of user {}",
                    user_id
                ))
            })
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn append_transaction(&self, entry: NewTransaction) -> RepositoryResult<Posting> {
        let mut ledger = self.lock_user(entry.user_id).await?;
        let (wallet, transaction) = ledger.stage(entry)?;
        Ok(ledger.commit(wallet, transaction))
    }

    async fn get_wallet(&self, user_id: Uuid) -> RepositoryResult<Wallet> {
        let ledger = match self.ledgers.read().await.get(&user_id) {
            Some(ledger) => ledger.clone(),
            None => return Ok(Wallet::empty(user_id)),
        };
        let guard = tokio::time::timeout(self.lock_timeout, ledger.lock())
            .await
            .map_err(|_| LedgerError::Busy(format!("wallet of user {} is locked", user_id)))?;
        Ok(guard.wallet.clone())
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        let log = self.wallet_log(user_id).await?;
        Ok(log
            .transactions
            .into_iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn wallet_log(&self, user_id: Uuid) -> RepositoryResult<WalletLog> {
        if !self.ledgers.read().await.contains_key(&user_id) {
            return Ok(WalletLog {
                wallet: Wallet::empty(user_id),
                transactions: Vec::new(),
            });
        }
        let ledger = self.lock_user(user_id).await?;
        Ok(WalletLog {
            wallet: ledger.wallet.clone(),
            transactions: ledger.transactions.clone(),
        })
    }

    async fn list_wallet_owners(&self) -> RepositoryResult<Vec<Uuid>> {
        Ok(self.ledgers.read().await.keys().copied().collect())
    }

    async fn insert_referral(&self, referral: &Referral) -> RepositoryResult<Referral> {
        let mut referrals = self.referrals.write().await;
        if referrals
            .values()
            .any(|existing| existing.referee_id == referral.referee_id)
        {
            return Err(LedgerError::InvalidReferralPair(format!(
                "user {} has already been referred",
                referral.referee_id
            )));
        }
        referrals.insert(referral.id, referral.clone());
        Ok(referral.clone())
    }

    async fn get_referral(&self, id: Uuid) -> RepositoryResult<Referral> {
        self.referrals
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("referral", id))
    }

    async fn list_referrals_by_referrer(&self, referrer_id: Uuid) -> RepositoryResult<Vec<Referral>> {
        let mut referrals: Vec<Referral> = self
            .referrals
            .read()
            .await
            .values()
            .filter(|referral| referral.referrer_id == referrer_id)
            .cloned()
            .collect();
        referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(referrals)
    }

    async fn complete_referral(
        &self,
        id: Uuid,
        reward: &RewardQuote,
        at: DateTime<Utc>,
    ) -> RepositoryResult<CompletionOutcome> {
        let mut referrals = self.referrals.write().await;
        let current = referrals
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("referral", id))?;
        match current.complete(reward, at)? {
            Transition::AlreadyApplied => Ok(CompletionOutcome::AlreadyCompleted(current.clone())),
            Transition::Advance(next) => {
                referrals.insert(id, next.clone());
                Ok(CompletionOutcome::Completed(next))
            }
        }
    }

    async fn credit_referral(
        &self,
        id: Uuid,
        fallback: &RewardQuote,
        at: DateTime<Utc>,
    ) -> RepositoryResult<CreditOutcome> {
        let referrer_id = self.get_referral(id).await?.referrer_id;
        let mut ledger = self.lock_user(referrer_id).await?;
        let mut referrals = self.referrals.write().await;
        let current = referrals
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("referral", id))?;

        match current.credit(fallback, at)? {
            Transition::AlreadyApplied => Ok(CreditOutcome::AlreadyCredited(current.clone())),
            Transition::Advance(next) => {
                let entry = NewTransaction::new(
                    referrer_id,
                    TransactionKind::Credit,
                    next.locked_reward()?.clone(),
                    Some(id),
                    format!("Referral reward ({})", next.referral_type.as_str()),
                );
                let (wallet, transaction) = ledger.stage(entry)?;
                referrals.insert(id, next.clone());
                let posting = ledger.commit(wallet, transaction);
                Ok(CreditOutcome::Credited {
                    referral: next,
                    posting,
                })
            }
        }
    }

    async fn create_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> RepositoryResult<(WithdrawalRequest, Posting)> {
        let mut ledger = self.lock_user(request.user_id).await?;
        let entry = NewTransaction::new(
            request.user_id,
            TransactionKind::WithdrawalReserve,
            request.amount.clone(),
            Some(request.id),
            format!("Withdrawal reserved ({})", request.method.as_str()),
        );
        let (wallet, transaction) = ledger.stage(entry)?;

        let mut withdrawals = self.withdrawals.write().await;
        if withdrawals.contains_key(&request.id) {
            return Err(LedgerError::Validation(format!(
                "withdrawal request {} already exists",
                request.id
            )));
        }
        withdrawals.insert(request.id, request.clone());
        let posting = ledger.commit(wallet, transaction);
        Ok((request.clone(), posting))
    }

    async fn get_withdrawal(&self, id: Uuid) -> RepositoryResult<WithdrawalRequest> {
        self.withdrawals
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("withdrawal request", id))
    }

    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<WithdrawalRequest>> {
        let mut requests: Vec<WithdrawalRequest> = self
            .withdrawals
            .read()
            .await
            .values()
            .filter(|request| status.map_or(true, |status| request.status == status))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_withdrawals_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<WithdrawalRequest>> {
        let mut requests: Vec<WithdrawalRequest> = self
            .withdrawals
            .read()
            .await
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn decide_withdrawal(
        &self,
        id: Uuid,
        action: WithdrawalAction,
        admin_id: Uuid,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<DecisionOutcome> {
        let user_id = self.get_withdrawal(id).await?.user_id;
        let mut ledger = self.lock_user(user_id).await?;
        let mut withdrawals = self.withdrawals.write().await;
        let current = withdrawals
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("withdrawal request", id))?;

        let next = match current.decide(action, admin_id, note, at)? {
            Transition::AlreadyApplied => {
                return Ok(DecisionOutcome::AlreadyApplied(current.clone()))
            }
            Transition::Advance(next) => next,
        };

        let staged = match action.ledger_effect() {
            Some(kind) => {
                let entry = NewTransaction::new(
                    user_id,
                    kind,
                    next.amount.clone(),
                    Some(id),
                    format!("Withdrawal {}", next.status),
                );
                Some(ledger.stage(entry)?)
            }
            None => None,
        };

        withdrawals.insert(id, next.clone());
        let posting = staged.map(|(wallet, transaction)| ledger.commit(wallet, transaction));
        Ok(DecisionOutcome::Applied {
            request: next,
            posting,
        })
    }

    async fn stats(&self) -> RepositoryResult<LedgerStats> {
        let mut stats = LedgerStats::default();
        for referral in self.referrals.read().await.values() {
            *stats.referrals_by_status.entry(referral.status).or_insert(0) += 1;
            if referral.status == crate::domain::ReferralStatus::Credited {
                if let Some(reward) = &referral.reward_amount {
                    stats.total_rewards_credited += reward;
                }
            }
        }
        for request in self.withdrawals.read().await.values() {
            let totals = stats
                .withdrawals_by_status
                .entry(request.status)
                .or_insert_with(|| StatusTotals {
                    count: 0,
                    amount: BigDecimal::zero(),
                });
            totals.count += 1;
            totals.amount += &request.amount;
        }
        Ok(stats)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryLedgerRepository {
    async fn load_settings(&self) -> RepositoryResult<Option<ReferralSettings>> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, settings: &ReferralSettings) -> RepositoryResult<ReferralSettings> {
        let mut stored = self.settings.write().await;
        let stored_version = stored.as_ref().map_or(0, |current| current.version);
        if stored_version != settings.version - 1 {
            return Err(LedgerError::Busy(format!(
                "settings changed concurrently (stored version {}, expected {})",
                stored_version,
                settings.version - 1
            )));
        }
        *stored = Some(settings.clone());
        Ok(settings.clone())
    }
}
