//! Storage ports of the ledger core.
//!
//! Every mutating method is one atomic unit: either all of its writes
//! (entity status, transaction row, wallet aggregate) become visible together
//! or none do. Implementations serialize mutations per user and guard entity
//! status changes with a compare-and-set, so callers never compensate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    NewTransaction, Referral, ReferralSettings, ReferralStatus, RewardQuote, Transaction, UserRole,
    Wallet, WithdrawalAction, WithdrawalRequest, WithdrawalStatus,
};
use crate::error::LedgerError;

pub type RepositoryResult<T> = Result<T, LedgerError>;

/// A transaction together with the wallet it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Posting {
    pub transaction: Transaction,
    pub wallet: Wallet,
}

#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Completed(Referral),
    AlreadyCompleted(Referral),
}

#[derive(Debug, Clone)]
pub enum CreditOutcome {
    Credited { referral: Referral, posting: Posting },
    AlreadyCredited(Referral),
}

#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    /// The transition was applied; `posting` is present when the action moves funds.
    Applied {
        request: WithdrawalRequest,
        posting: Option<Posting>,
    },
    AlreadyApplied(WithdrawalRequest),
}

/// Cached wallet next to the full log it was derived from, oldest first.
#[derive(Debug, Clone)]
pub struct WalletLog {
    pub wallet: Wallet,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusTotals {
    pub count: i64,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerStats {
    pub referrals_by_status: BTreeMap<ReferralStatus, i64>,
    pub total_rewards_credited: BigDecimal,
    pub withdrawals_by_status: BTreeMap<WithdrawalStatus, StatusTotals>,
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Appends one transaction and folds it into the owner's wallet.
    async fn append_transaction(&self, entry: NewTransaction) -> RepositoryResult<Posting>;

    /// Zeroed wallet for users without any transaction yet.
    async fn get_wallet(&self, user_id: Uuid) -> RepositoryResult<Wallet>;

    /// Newest first.
    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>>;

    async fn wallet_log(&self, user_id: Uuid) -> RepositoryResult<WalletLog>;

    async fn list_wallet_owners(&self) -> RepositoryResult<Vec<Uuid>>;

    /// Fails with `InvalidReferralPair` when the referee was already attributed.
    async fn insert_referral(&self, referral: &Referral) -> RepositoryResult<Referral>;

    async fn get_referral(&self, id: Uuid) -> RepositoryResult<Referral>;

    async fn list_referrals_by_referrer(&self, referrer_id: Uuid) -> RepositoryResult<Vec<Referral>>;

    /// Compare-and-set pending -> completed with `reward` locked in.
    async fn complete_referral(
        &self,
        id: Uuid,
        reward: &RewardQuote,
        at: DateTime<Utc>,
    ) -> RepositoryResult<CompletionOutcome>;

    /// Compare-and-set -> credited plus the matching `credit` transaction for
    /// the referrer. `fallback` prices referrals that never completed.
    async fn credit_referral(
        &self,
        id: Uuid,
        fallback: &RewardQuote,
        at: DateTime<Utc>,
    ) -> RepositoryResult<CreditOutcome>;

    /// Inserts the request and its `withdrawal_reserve` transaction together.
    async fn create_withdrawal(&self, request: &WithdrawalRequest) -> RepositoryResult<(WithdrawalRequest, Posting)>;

    async fn get_withdrawal(&self, id: Uuid) -> RepositoryResult<WithdrawalRequest>;

    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<WithdrawalRequest>>;

    async fn list_withdrawals_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<WithdrawalRequest>>;

    /// Compare-and-set on the request status plus the action's ledger effect.
    async fn decide_withdrawal(
        &self,
        id: Uuid,
        action: WithdrawalAction,
        admin_id: Uuid,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<DecisionOutcome>;

    async fn stats(&self) -> RepositoryResult<LedgerStats>;

    async fn ping(&self) -> RepositoryResult<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load_settings(&self) -> RepositoryResult<Option<ReferralSettings>>;

    /// Persists a new version. Fails with `Busy` if `settings.version - 1` is
    /// no longer the stored version.
    async fn save_settings(&self, settings: &ReferralSettings) -> RepositoryResult<ReferralSettings>;
}

/// Role lookup owned by the registration flow.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn role_of(&self, user_id: Uuid) -> RepositoryResult<Option<UserRole>>;
}
