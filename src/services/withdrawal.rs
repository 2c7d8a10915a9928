use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{Outcome, OutcomeKind, SettingsProvider};
use crate::domain::{PaymentMethod, WithdrawalAction, WithdrawalRequest, WithdrawalStatus};
use crate::error::LedgerError;
use crate::ports::{DecisionOutcome, LedgerRepository};
use crate::validation::{
    sanitize_string, validate_admin_note, validate_amount, validate_max_len,
    validate_payment_details, ADMIN_NOTE_MAX_LEN,
};

use super::ledger::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Withdrawal requests from reservation to payout or release.
pub struct WithdrawalWorkflow {
    repository: Arc<dyn LedgerRepository>,
    settings: Arc<SettingsProvider>,
}

impl WithdrawalWorkflow {
    pub fn new(repository: Arc<dyn LedgerRepository>, settings: Arc<SettingsProvider>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Creates a pending request and reserves its funds in the same step.
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        method: PaymentMethod,
        details: &serde_json::Value,
    ) -> Result<Outcome<WithdrawalRequest>, LedgerError> {
        validate_amount("amount", &amount)?;

        let minimum = self.settings.snapshot().min_withdrawal.clone();
        if amount < minimum {
            return Err(LedgerError::BelowMinimum {
                requested: amount,
                minimum,
            });
        }

        let details = validate_payment_details(method, details)?;
        let (request, posting) = self
            .repository
            .create_withdrawal(&WithdrawalRequest::new(user_id, amount, method, details))
            .await?;

        tracing::info!(
            withdrawal_id = %request.id,
            user_id = %user_id,
            amount = %request.amount,
            method = method.as_str(),
            available_balance = %posting.wallet.available_balance,
            "Withdrawal requested; funds reserved"
        );
        let message = format!("Withdrawal of {} requested", request.amount);
        Ok(Outcome::new(OutcomeKind::Requested, message, request).with_posting(Some(posting)))
    }

    pub async fn approve(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        note: Option<&str>,
    ) -> Result<Outcome<WithdrawalRequest>, LedgerError> {
        let note = optional_note(note)?;
        self.decide(request_id, WithdrawalAction::Approve, admin_id, note.as_deref())
            .await
    }

    /// Idempotent: a processed request reports `already_processed`.
    pub async fn process(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        note: Option<&str>,
    ) -> Result<Outcome<WithdrawalRequest>, LedgerError> {
        let note = optional_note(note)?;
        self.decide(request_id, WithdrawalAction::Process, admin_id, note.as_deref())
            .await
    }

    /// Releases the reservation. A note is mandatory, except on a retry
    /// against a request that is already rejected.
    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        note: &str,
    ) -> Result<Outcome<WithdrawalRequest>, LedgerError> {
        let note = sanitize_string(note);
        if let Err(err) = validate_admin_note(&note) {
            // Rejected is terminal, so this read cannot go stale.
            let current = self.repository.get_withdrawal(request_id).await?;
            if current.status != WithdrawalStatus::Rejected {
                return Err(err.into());
            }
            return self
                .decide(request_id, WithdrawalAction::Reject, admin_id, None)
                .await;
        }
        self.decide(request_id, WithdrawalAction::Reject, admin_id, Some(&note))
            .await
    }

    async fn decide(
        &self,
        request_id: Uuid,
        action: WithdrawalAction,
        admin_id: Uuid,
        note: Option<&str>,
    ) -> Result<Outcome<WithdrawalRequest>, LedgerError> {
        let decision = self
            .repository
            .decide_withdrawal(request_id, action, admin_id, note, Utc::now())
            .await?;

        match decision {
            DecisionOutcome::Applied { request, posting } => {
                tracing::info!(
                    withdrawal_id = %request_id,
                    user_id = %request.user_id,
                    admin_id = %admin_id,
                    amount = %request.amount,
                    status = %request.status,
                    "Withdrawal request {}",
                    request.status
                );
                let (kind, message) = match request.status {
                    WithdrawalStatus::Approved => (
                        OutcomeKind::Approved,
                        "Withdrawal approved; funds remain reserved".to_string(),
                    ),
                    WithdrawalStatus::Processed => (
                        OutcomeKind::Processed,
                        format!("Withdrawal of {} paid out", request.amount),
                    ),
                    WithdrawalStatus::Rejected => (
                        OutcomeKind::Rejected,
                        format!("Withdrawal rejected; {} returned to the wallet", request.amount),
                    ),
                    WithdrawalStatus::Pending => {
                        return Err(LedgerError::Storage(format!(
                            "withdrawal request {} is still pending after {}",
                            request_id, action
                        )))
                    }
                };
                Ok(Outcome::new(kind, message, request).with_posting(posting))
            }
            DecisionOutcome::AlreadyApplied(request) => {
                tracing::info!(
                    withdrawal_id = %request_id,
                    status = %request.status,
                    "Withdrawal {} ignored; already applied",
                    action
                );
                let (kind, message) = match action {
                    WithdrawalAction::Reject => {
                        (OutcomeKind::AlreadyRejected, "Withdrawal was already rejected")
                    }
                    _ => (OutcomeKind::AlreadyProcessed, "Withdrawal was already processed"),
                };
                Ok(Outcome::new(kind, message, request))
            }
        }
    }

    pub async fn get_withdrawal(&self, request_id: Uuid) -> Result<WithdrawalRequest, LedgerError> {
        self.repository.get_withdrawal(request_id).await
    }

    pub async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<WithdrawalRequest>, LedgerError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        self.repository.list_withdrawals(status, limit, offset).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WithdrawalRequest>, LedgerError> {
        self.repository.list_withdrawals_for_user(user_id).await
    }
}

fn optional_note(note: Option<&str>) -> Result<Option<String>, LedgerError> {
    let note = note.map(sanitize_string).filter(|note| !note.is_empty());
    if let Some(note) = &note {
        validate_max_len("note", note, ADMIN_NOTE_MAX_LEN)?;
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerRepository;
    use crate::domain::{SettingsUpdate, TransactionKind};
    use crate::services::LedgerService;
    use bigdecimal::Zero;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        workflow: Arc<WithdrawalWorkflow>,
        ledger: LedgerService,
        settings: Arc<SettingsProvider>,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryLedgerRepository::new(Duration::from_secs(1)));
        let settings = SettingsProvider::load(repo.clone()).await.unwrap();
        Fixture {
            workflow: Arc::new(WithdrawalWorkflow::new(repo.clone(), settings.clone())),
            ledger: LedgerService::new(repo),
            settings,
        }
    }

    fn amount(value: i64) -> BigDecimal {
        BigDecimal::from(value)
    }

    fn upi() -> serde_json::Value {
        json!({"upi_id": "alice@okbank"})
    }

    async fn funded_user(f: &Fixture, value: i64) -> Uuid {
        let user = Uuid::new_v4();
        f.ledger
            .grant(user, TransactionKind::Credit, amount(value), "referral reward")
            .await
            .unwrap();
        user
    }

    async fn request(f: &Fixture, user: Uuid, value: i64) -> WithdrawalRequest {
        f.workflow
            .request_withdrawal(user, amount(value), PaymentMethod::Upi, &upi())
            .await
            .unwrap()
            .data
    }

    #[tokio::test]
    async fn test_request_scenario_with_reject() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let admin = Uuid::new_v4();

        let too_much = f
            .workflow
            .request_withdrawal(user, amount(600), PaymentMethod::Upi, &upi())
            .await;
        assert!(matches!(too_much, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(f.ledger.get_wallet(user).await.unwrap().available_balance, amount(500));

        let too_little = f
            .workflow
            .request_withdrawal(user, amount(50), PaymentMethod::Upi, &upi())
            .await;
        assert!(matches!(too_little, Err(LedgerError::BelowMinimum { .. })));

        let created = request(&f, user, 200).await;
        let wallet = f.ledger.get_wallet(user).await.unwrap();
        assert_eq!(wallet.available_balance, amount(300));
        assert_eq!(wallet.pending_withdrawal, amount(200));

        let rejected = f
            .workflow
            .reject(created.id, admin, "account name mismatch")
            .await
            .unwrap();
        assert_eq!(rejected.outcome, OutcomeKind::Rejected);
        assert_eq!(rejected.data.admin_note.as_deref(), Some("account name mismatch"));
        assert_eq!(rejected.data.decided_by, Some(admin));

        let wallet = f.ledger.get_wallet(user).await.unwrap();
        assert_eq!(wallet.available_balance, amount(500));
        assert_eq!(wallet.pending_withdrawal, BigDecimal::zero());
        assert!(wallet.is_reconciled());

        let again = f
            .workflow
            .reject(created.id, admin, "duplicate click")
            .await
            .unwrap();
        assert_eq!(again.outcome, OutcomeKind::AlreadyRejected);
        assert_eq!(again.data.admin_note.as_deref(), Some("account name mismatch"));
        assert_eq!(f.ledger.full_history(user).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_approve_then_process_realizes_debit() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let admin = Uuid::new_v4();
        let created = request(&f, user, 100).await;

        let approved = f.workflow.approve(created.id, admin, None).await.unwrap();
        assert_eq!(approved.outcome, OutcomeKind::Approved);
        assert!(approved.posting.is_none());

        let processed = f
            .workflow
            .process(created.id, admin, Some("UTR 4411"))
            .await
            .unwrap();
        assert_eq!(processed.outcome, OutcomeKind::Processed);

        let wallet = f.ledger.get_wallet(user).await.unwrap();
        assert_eq!(wallet.available_balance, amount(400));
        assert_eq!(wallet.pending_withdrawal, BigDecimal::zero());
        assert_eq!(wallet.total_withdrawn, amount(100));

        let again = f.workflow.process(created.id, admin, None).await.unwrap();
        assert_eq!(again.outcome, OutcomeKind::AlreadyProcessed);
        assert_eq!(f.ledger.get_wallet(user).await.unwrap().total_withdrawn, amount(100));
    }

    #[tokio::test]
    async fn test_illegal_transitions_have_no_effect() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let admin = Uuid::new_v4();
        let created = request(&f, user, 100).await;

        let early = f.workflow.process(created.id, admin, None).await;
        assert!(matches!(early, Err(LedgerError::InvalidTransition { .. })));

        f.workflow.approve(created.id, admin, None).await.unwrap();
        let twice = f.workflow.approve(created.id, admin, None).await;
        assert!(matches!(twice, Err(LedgerError::InvalidTransition { .. })));

        let late_reject = f.workflow.reject(created.id, admin, "too late").await;
        assert!(matches!(late_reject, Err(LedgerError::InvalidTransition { .. })));

        let wallet = f.ledger.get_wallet(user).await.unwrap();
        assert_eq!(wallet.pending_withdrawal, amount(100));
    }

    #[tokio::test]
    async fn test_reject_requires_note() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let created = request(&f, user, 100).await;

        let err = f
            .workflow
            .reject(created.id, Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(
            f.workflow.get_withdrawal(created.id).await.unwrap().status,
            WithdrawalStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_reject_retry_without_note_reports_already_rejected() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let admin = Uuid::new_v4();
        let created = request(&f, user, 200).await;

        let first = f
            .workflow
            .reject(created.id, admin, "name\nmismatch")
            .await
            .unwrap();
        assert_eq!(first.outcome, OutcomeKind::Rejected);
        assert_eq!(first.data.admin_note.as_deref(), Some("name mismatch"));

        let retry = f.workflow.reject(created.id, admin, "").await.unwrap();
        assert_eq!(retry.outcome, OutcomeKind::AlreadyRejected);
        assert_eq!(retry.data.admin_note.as_deref(), Some("name mismatch"));
        assert_eq!(f.ledger.get_wallet(user).await.unwrap().available_balance, amount(500));
    }

    #[tokio::test]
    async fn test_payment_details_are_validated() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;

        let err = f
            .workflow
            .request_withdrawal(user, amount(100), PaymentMethod::Bank, &upi())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(f.ledger.get_wallet(user).await.unwrap().pending_withdrawal, BigDecimal::zero());
    }

    #[tokio::test]
    async fn test_minimum_follows_settings_snapshot() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        f.settings
            .update(SettingsUpdate {
                min_withdrawal: Some(amount(300)),
                ..SettingsUpdate::default()
            })
            .await
            .unwrap();

        let err = f
            .workflow
            .request_withdrawal(user, amount(200), PaymentMethod::Upi, &upi())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BelowMinimum { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_requests_cannot_double_spend() {
        let f = fixture().await;
        let user = funded_user(&f, 300).await;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let workflow = f.workflow.clone();
                tokio::spawn(async move {
                    workflow
                        .request_withdrawal(user, amount(100), PaymentMethod::Upi, &upi())
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(LedgerError::InsufficientFunds { .. }) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(accepted, 3);

        let wallet = f.ledger.get_wallet(user).await.unwrap();
        assert_eq!(wallet.available_balance, BigDecimal::zero());
        assert_eq!(wallet.pending_withdrawal, amount(300));
        assert!(wallet.is_reconciled());
    }

    #[tokio::test]
    async fn test_lists_by_status_and_user() {
        let f = fixture().await;
        let user = funded_user(&f, 500).await;
        let first = request(&f, user, 100).await;
        request(&f, user, 100).await;
        f.workflow.approve(first.id, Uuid::new_v4(), None).await.unwrap();

        let pending = f
            .workflow
            .list_withdrawals(Some(WithdrawalStatus::Pending), None, None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(f.workflow.list_for_user(user).await.unwrap().len(), 2);
    }
}
