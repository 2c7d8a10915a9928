//! Postgres implementation of the ledger ports.
//!
//! Every mutating call runs in one SQL transaction with a bounded
//! `lock_timeout`. Entity rows are locked before the wallet row
//! (`SELECT ... FOR UPDATE`), which serializes both admin races on one entity
//! and concurrent postings for one user without any global lock.

use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::domain::{
    NewTransaction, PaymentMethod, Referral, ReferralSettings, ReferralStatus, ReferralType,
    RewardQuote, Transaction, TransactionKind, Transition, Wallet, WithdrawalAction,
    WithdrawalRequest, WithdrawalStatus,
};
use crate::error::LedgerError;
use crate::ports::{
    CompletionOutcome, CreditOutcome, DecisionOutcome, LedgerRepository, LedgerStats, Posting,
    RepositoryResult, SettingsRepository, StatusTotals, WalletLog,
};

const WALLET_COLUMNS: &str =
    "user_id, available_balance, pending_withdrawal, total_earned, total_withdrawn, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, kind, amount, description, related_entity_id, created_at";
const REFERRAL_COLUMNS: &str = "id, referrer_id, referee_id, referral_type, status, reward_amount, \
     settings_version, created_at, completed_at, credited_at";
const WITHDRAWAL_COLUMNS: &str = "id, user_id, amount, method, details, status, admin_note, \
     decided_by, created_at, decided_at";
const SETTINGS_COLUMNS: &str = "patient_to_patient_reward, doctor_to_doctor_reward, \
     doctor_to_patient_reward, min_withdrawal, is_enabled, version, updated_at";

/// Postgres-backed ledger repository.
#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    async fn begin(&self) -> RepositoryResult<SqlxTransaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters; the value is an integer we format ourselves.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }

    /// Takes the per-user row lock, creating the wallet on first use.
    async fn lock_wallet(
        tx: &mut SqlxTransaction<'static, Postgres>,
        user_id: Uuid,
    ) -> RepositoryResult<Wallet> {
        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1 FOR UPDATE",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.into_domain())
    }

    /// Applies `entry` to the locked `wallet` and writes both rows. The domain
    /// check runs before any statement, so a rejected movement writes nothing.
    /// The posting is stamped here, after the wallet lock was granted, so
    /// timestamps follow `seq` order for each user.
    async fn post(
        tx: &mut SqlxTransaction<'static, Postgres>,
        wallet: &Wallet,
        entry: NewTransaction,
    ) -> RepositoryResult<Posting> {
        let at = Utc::now();
        let next = wallet.apply(entry.kind, &entry.amount, at)?;
        let transaction = entry.into_transaction(at);

        sqlx::query(
            r#"
            UPDATE wallets
            SET available_balance = $2, pending_withdrawal = $3,
                total_earned = $4, total_withdrawn = $5, updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(next.user_id)
        .bind(&next.available_balance)
        .bind(&next.pending_withdrawal)
        .bind(&next.total_earned)
        .bind(&next.total_withdrawn)
        .bind(next.updated_at)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO wallet_transactions ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {cols}
            "#,
            cols = TRANSACTION_COLUMNS
        ))
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.kind.as_str())
        .bind(&transaction.amount)
        .bind(&transaction.description)
        .bind(transaction.related_entity_id)
        .bind(transaction.created_at)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Posting {
            transaction: row.into_domain()?,
            wallet: next,
        })
    }

    async fn lock_referral(
        tx: &mut SqlxTransaction<'static, Postgres>,
        id: Uuid,
    ) -> RepositoryResult<Referral> {
        sqlx::query_as::<_, ReferralRow>(&format!(
            "SELECT {} FROM referrals WHERE id = $1 FOR UPDATE",
            REFERRAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| LedgerError::not_found("referral", id))?
        .into_domain()
    }

    async fn update_referral(
        tx: &mut SqlxTransaction<'static, Postgres>,
        referral: &Referral,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE referrals
            SET status = $2, reward_amount = $3, settings_version = $4,
                completed_at = $5, credited_at = $6
            WHERE id = $1
            "#,
        )
        .bind(referral.id)
        .bind(referral.status.as_str())
        .bind(&referral.reward_amount)
        .bind(referral.settings_version)
        .bind(referral.completed_at)
        .bind(referral.credited_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn append_transaction(&self, entry: NewTransaction) -> RepositoryResult<Posting> {
        let mut tx = self.begin().await?;
        let wallet = Self::lock_wallet(&mut tx, entry.user_id).await?;
        let posting = Self::post(&mut tx, &wallet, entry).await?;
        tx.commit().await?;
        Ok(posting)
    }

    async fn get_wallet(&self, user_id: Uuid) -> RepositoryResult<Wallet> {
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map_or_else(|| Wallet::empty(user_id), WalletRow::into_domain))
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            SELECT {} FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY seq DESC
            LIMIT $2 OFFSET $3
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn wallet_log(&self, user_id: Uuid) -> RepositoryResult<WalletLog> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let wallet = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map_or_else(|| Wallet::empty(user_id), WalletRow::into_domain);

        let transactions = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM wallet_transactions WHERE user_id = $1 ORDER BY seq",
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(TransactionRow::into_domain)
        .collect::<RepositoryResult<Vec<_>>>()?;

        tx.commit().await?;
        Ok(WalletLog {
            wallet,
            transactions,
        })
    }

    async fn list_wallet_owners(&self) -> RepositoryResult<Vec<Uuid>> {
        Ok(
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM wallets ORDER BY user_id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn insert_referral(&self, referral: &Referral) -> RepositoryResult<Referral> {
        let row = sqlx::query_as::<_, ReferralRow>(&format!(
            r#"
            INSERT INTO referrals ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (referee_id) DO NOTHING
            RETURNING {cols}
            "#,
            cols = REFERRAL_COLUMNS
        ))
        .bind(referral.id)
        .bind(referral.referrer_id)
        .bind(referral.referee_id)
        .bind(referral.referral_type.as_str())
        .bind(referral.status.as_str())
        .bind(&referral.reward_amount)
        .bind(referral.settings_version)
        .bind(referral.created_at)
        .bind(referral.completed_at)
        .bind(referral.credited_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            LedgerError::InvalidReferralPair(format!(
                "user {} has already been referred",
                referral.referee_id
            ))
        })?
        .into_domain()
    }

    async fn get_referral(&self, id: Uuid) -> RepositoryResult<Referral> {
        sqlx::query_as::<_, ReferralRow>(&format!(
            "SELECT {} FROM referrals WHERE id = $1",
            REFERRAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("referral", id))?
        .into_domain()
    }

    async fn list_referrals_by_referrer(&self, referrer_id: Uuid) -> RepositoryResult<Vec<Referral>> {
        sqlx::query_as::<_, ReferralRow>(&format!(
            "SELECT {} FROM referrals WHERE referrer_id = $1 ORDER BY created_at DESC",
            REFERRAL_COLUMNS
        ))
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReferralRow::into_domain)
        .collect()
    }

    async fn complete_referral(
        &self,
        id: Uuid,
        reward: &RewardQuote,
        at: DateTime<Utc>,
    ) -> RepositoryResult<CompletionOutcome> {
        let mut tx = self.begin().await?;
        let current = Self::lock_referral(&mut tx, id).await?;

        match current.complete(reward, at)? {
            Transition::AlreadyApplied => {
                tx.rollback().await?;
                Ok(CompletionOutcome::AlreadyCompleted(current))
            }
            Transition::Advance(next) => {
                Self::update_referral(&mut tx, &next).await?;
                tx.commit().await?;
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
        let mut tx = self.begin().await?;
        let current = Self::lock_referral(&mut tx, id).await?;

        let next = match current.credit(fallback, at)? {
            Transition::AlreadyApplied => {
                tx.rollback().await?;
                return Ok(CreditOutcome::AlreadyCredited(current));
            }
            Transition::Advance(next) => next,
        };

        let wallet = Self::lock_wallet(&mut tx, next.referrer_id).await?;
        let entry = NewTransaction::new(
            next.referrer_id,
            TransactionKind::Credit,
            next.locked_reward()?.clone(),
            Some(id),
            format!("Referral reward ({})", next.referral_type.as_str()),
        );
        let posting = Self::post(&mut tx, &wallet, entry).await?;
        Self::update_referral(&mut tx, &next).await?;
        tx.commit().await?;

        Ok(CreditOutcome::Credited {
            referral: next,
            posting,
        })
    }

    async fn create_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> RepositoryResult<(WithdrawalRequest, Posting)> {
        let mut tx = self.begin().await?;
        let wallet = Self::lock_wallet(&mut tx, request.user_id).await?;
        let entry = NewTransaction::new(
            request.user_id,
            TransactionKind::WithdrawalReserve,
            request.amount.clone(),
            Some(request.id),
            format!("Withdrawal reserved ({})", request.method.as_str()),
        );
        let posting = Self::post(&mut tx, &wallet, entry).await?;

        let row = sqlx::query_as::<_, WithdrawalRow>(&format!(
            r#"
            INSERT INTO withdrawal_requests ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {cols}
            "#,
            cols = WITHDRAWAL_COLUMNS
        ))
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.amount)
        .bind(request.method.as_str())
        .bind(&request.details)
        .bind(request.status.as_str())
        .bind(&request.admin_note)
        .bind(request.decided_by)
        .bind(request.created_at)
        .bind(request.decided_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.into_domain()?, posting))
    }

    async fn get_withdrawal(&self, id: Uuid) -> RepositoryResult<WithdrawalRequest> {
        sqlx::query_as::<_, WithdrawalRow>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LedgerError::not_found("withdrawal request", id))?
        .into_domain()
    }

    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<WithdrawalRequest>> {
        sqlx::query_as::<_, WithdrawalRow>(&format!(
            r#"
            SELECT {} FROM withdrawal_requests
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(WithdrawalRow::into_domain)
        .collect()
    }

    async fn list_withdrawals_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<WithdrawalRequest>> {
        sqlx::query_as::<_, WithdrawalRow>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE user_id = $1 ORDER BY created_at DESC",
            WITHDRAWAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(WithdrawalRow::into_domain)
        .collect()
    }

    async fn decide_withdrawal(
        &self,
        id: Uuid,
        action: WithdrawalAction,
        admin_id: Uuid,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<DecisionOutcome> {
        let mut tx = self.begin().await?;
        let current = sqlx::query_as::<_, WithdrawalRow>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LedgerError::not_found("withdrawal request", id))?
        .into_domain()?;

        let next = match current.decide(action, admin_id, note, at)? {
            Transition::AlreadyApplied => {
                tx.rollback().await?;
                return Ok(DecisionOutcome::AlreadyApplied(current));
            }
            Transition::Advance(next) => next,
        };

        let wallet = Self::lock_wallet(&mut tx, next.user_id).await?;
        let posting = match action.ledger_effect() {
            Some(kind) => {
                let entry = NewTransaction::new(
                    next.user_id,
                    kind,
                    next.amount.clone(),
                    Some(id),
                    format!("Withdrawal {}", next.status),
                );
                Some(Self::post(&mut tx, &wallet, entry).await?)
            }
            None => None,
        };

        sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = $2, admin_note = $3, decided_by = $4, decided_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(next.status.as_str())
        .bind(&next.admin_note)
        .bind(next.decided_by)
        .bind(next.decided_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(DecisionOutcome::Applied {
            request: next,
            posting,
        })
    }

    async fn stats(&self) -> RepositoryResult<LedgerStats> {
        let mut stats = LedgerStats::default();

        let referral_counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM referrals GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        for (status, count) in referral_counts {
            stats
                .referrals_by_status
                .insert(status.parse::<ReferralStatus>()?, count);
        }

        stats.total_rewards_credited = sqlx::query_scalar::<_, BigDecimal>(
            "SELECT COALESCE(SUM(reward_amount), 0) FROM referrals WHERE status = 'credited'",
        )
        .fetch_one(&self.pool)
        .await?;

        let withdrawal_totals: Vec<(String, i64, BigDecimal)> = sqlx::query_as(
            "SELECT status, COUNT(*), COALESCE(SUM(amount), 0) FROM withdrawal_requests GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        for (status, count, amount) in withdrawal_totals {
            stats.withdrawals_by_status.insert(
                status
                    .parse::<WithdrawalStatus>()
                    .map_err(|e| LedgerError::Storage(e.to_string()))?,
                StatusTotals { count, amount },
            );
        }

        Ok(stats)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for PostgresLedgerRepository {
    async fn load_settings(&self) -> RepositoryResult<Option<ReferralSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(&format!(
            "SELECT {} FROM referral_settings WHERE id = 1",
            SETTINGS_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SettingsRow::into_domain))
    }

    async fn save_settings(&self, settings: &ReferralSettings) -> RepositoryResult<ReferralSettings> {
        // Version 1 is the first stored row; later versions must replace
        // exactly their predecessor.
        let sql = if settings.version == 1 {
            format!(
                r#"
                INSERT INTO referral_settings (id, {cols})
                VALUES (1, $1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO NOTHING
                RETURNING {cols}
                "#,
                cols = SETTINGS_COLUMNS
            )
        } else {
            format!(
                r#"
                UPDATE referral_settings
                SET patient_to_patient_reward = $1, doctor_to_doctor_reward = $2,
                    doctor_to_patient_reward = $3, min_withdrawal = $4,
                    is_enabled = $5, version = $6, updated_at = $7
                WHERE id = 1 AND version = $6 - 1
                RETURNING {cols}
                "#,
                cols = SETTINGS_COLUMNS
            )
        };

        let row = sqlx::query_as::<_, SettingsRow>(&sql)
            .bind(&settings.patient_to_patient_reward)
            .bind(&settings.doctor_to_doctor_reward)
            .bind(&settings.doctor_to_patient_reward)
            .bind(&settings.min_withdrawal)
            .bind(settings.is_enabled)
            .bind(settings.version)
            .bind(settings.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SettingsRow::into_domain).ok_or_else(|| {
            LedgerError::Busy(format!(
                "settings changed concurrently; version {} was not the next version",
                settings.version
            ))
        })
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    user_id: Uuid,
    available_balance: BigDecimal,
    pending_withdrawal: BigDecimal,
    total_earned: BigDecimal,
    total_withdrawn: BigDecimal,
    updated_at: DateTime<Utc>,
}

impl WalletRow {
    fn into_domain(self) -> Wallet {
        Wallet {
            user_id: self.user_id,
            available_balance: self.available_balance,
            pending_withdrawal: self.pending_withdrawal,
            total_earned: self.total_earned,
            total_withdrawn: self.total_withdrawn,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    amount: BigDecimal,
    description: String,
    related_entity_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind.parse()?,
            amount: self.amount,
            description: self.description,
            related_entity_id: self.related_entity_id,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReferralRow {
    id: Uuid,
    referrer_id: Uuid,
    referee_id: Uuid,
    referral_type: String,
    status: String,
    reward_amount: Option<BigDecimal>,
    settings_version: Option<i64>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    credited_at: Option<DateTime<Utc>>,
}

impl ReferralRow {
    fn into_domain(self) -> RepositoryResult<Referral> {
        Ok(Referral {
            id: self.id,
            referrer_id: self.referrer_id,
            referee_id: self.referee_id,
            referral_type: self.referral_type.parse::<ReferralType>()?,
            status: self.status.parse::<ReferralStatus>()?,
            reward_amount: self.reward_amount,
            settings_version: self.settings_version,
            created_at: self.created_at,
            completed_at: self.completed_at,
            credited_at: self.credited_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WithdrawalRow {
    id: Uuid,
    user_id: Uuid,
    amount: BigDecimal,
    method: String,
    details: serde_json::Value,
    status: String,
    admin_note: Option<String>,
    decided_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl WithdrawalRow {
    fn into_domain(self) -> RepositoryResult<WithdrawalRequest> {
        Ok(WithdrawalRequest {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            method: self.method.parse::<PaymentMethod>()?,
            details: self.details,
            status: self
                .status
                .parse::<WithdrawalStatus>()
                .map_err(|e| LedgerError::Storage(e.to_string()))?,
            admin_note: self.admin_note,
            decided_by: self.decided_by,
            created_at: self.created_at,
            decided_at: self.decided_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    patient_to_patient_reward: BigDecimal,
    doctor_to_doctor_reward: BigDecimal,
    doctor_to_patient_reward: BigDecimal,
    min_withdrawal: BigDecimal,
    is_enabled: bool,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl SettingsRow {
    fn into_domain(self) -> ReferralSettings {
        ReferralSettings {
            patient_to_patient_reward: self.patient_to_patient_reward,
            doctor_to_doctor_reward: self.doctor_to_doctor_reward,
            doctor_to_patient_reward: self.doctor_to_patient_reward,
            min_withdrawal: self.min_withdrawal,
            is_enabled: self.is_enabled,
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}
