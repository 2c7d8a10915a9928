use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{Outcome, OutcomeKind, SettingsProvider};
use crate::domain::Referral;
use crate::error::LedgerError;
use crate::ports::{CreditOutcome, LedgerRepository};

/// Pays referral rewards into the referrer's wallet, exactly once per referral.
pub struct RewardCreditingService {
    repository: Arc<dyn LedgerRepository>,
    settings: Arc<SettingsProvider>,
}

impl RewardCreditingService {
    pub fn new(repository: Arc<dyn LedgerRepository>, settings: Arc<SettingsProvider>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Flips the referral to `credited` and appends the matching credit in one
    /// atomic step. Pending referrals are priced from the current settings.
    pub async fn credit_referral(&self, referral_id: Uuid) -> Result<Outcome<Referral>, LedgerError> {
        let referral = self.repository.get_referral(referral_id).await?;
        let fallback = self.settings.snapshot().reward_for(referral.referral_type);

        match self
            .repository
            .credit_referral(referral_id, &fallback, Utc::now())
            .await?
        {
            CreditOutcome::Credited { referral, posting } => {
                tracing::info!(
                    referral_id = %referral_id,
                    user_id = %referral.referrer_id,
                    transaction_id = %posting.transaction.id,
                    amount = %posting.transaction.amount,
                    kind = %posting.transaction.kind,
                    "Referral reward credited"
                );
                let message = format!(
                    "Credited {} to the referrer's wallet",
                    posting.transaction.amount
                );
                Ok(Outcome::new(OutcomeKind::Credited, message, referral).with_posting(Some(posting)))
            }
            CreditOutcome::AlreadyCredited(referral) => {
                tracing::info!(referral_id = %referral_id, "Referral already credited; no ledger write");
                Ok(Outcome::new(
                    OutcomeKind::AlreadyCredited,
                    "Referral reward was already credited",
                    referral,
                ))
            }
        }
    }
}
