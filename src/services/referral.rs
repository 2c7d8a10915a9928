use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{Outcome, OutcomeKind, SettingsProvider};
use crate::domain::{Referral, ReferralType};
use crate::error::LedgerError;
use crate::ports::{CompletionOutcome, LedgerRepository, UserDirectory};

/// Attributes signups to referrers and tracks qualification.
pub struct ReferralEngine {
    repository: Arc<dyn LedgerRepository>,
    users: Arc<dyn UserDirectory>,
    settings: Arc<SettingsProvider>,
}

impl ReferralEngine {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        users: Arc<dyn UserDirectory>,
        settings: Arc<SettingsProvider>,
    ) -> Self {
        Self {
            repository,
            users,
            settings,
        }
    }

    pub async fn create_referral(
        &self,
        referrer_id: Uuid,
        referee_id: Uuid,
    ) -> Result<Outcome<Referral>, LedgerError> {
        if !self.settings.snapshot().is_enabled {
            return Err(LedgerError::InvalidReferralPair(
                "the referral program is disabled".to_string(),
            ));
        }
        if referrer_id == referee_id {
            return Err(LedgerError::InvalidReferralPair(
                "users cannot refer themselves".to_string(),
            ));
        }

        let referrer_role = self
            .users
            .role_of(referrer_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", referrer_id))?;
        let referee_role = self
            .users
            .role_of(referee_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", referee_id))?;

        let referral_type = ReferralType::from_roles(referrer_role, referee_role).ok_or_else(|| {
            LedgerError::InvalidReferralPair(format!(
                "{:?} -> {:?} is not a valid referral pair",
                referrer_role, referee_role
            ))
        })?;

        let referral = self
            .repository
            .insert_referral(&Referral::new(referrer_id, referee_id, referral_type))
            .await?;

        tracing::info!(
            referral_id = %referral.id,
            referrer_id = %referrer_id,
            referee_id = %referee_id,
            referral_type = referral_type.as_str(),
            "Referral created"
        );
        Ok(Outcome::new(OutcomeKind::Created, "Referral recorded", referral))
    }

    /// Idempotent: a referral past `pending` reports `already_completed` and
    /// keeps its locked reward.
    pub async fn mark_completed(&self, referral_id: Uuid) -> Result<Outcome<Referral>, LedgerError> {
        let referral = self.repository.get_referral(referral_id).await?;
        let quote = self.settings.snapshot().reward_for(referral.referral_type);

        match self
            .repository
            .complete_referral(referral_id, &quote, Utc::now())
            .await?
        {
            CompletionOutcome::Completed(referral) => {
                tracing::info!(
                    referral_id = %referral_id,
                    amount = %quote.amount,
                    settings_version = quote.settings_version,
                    "Referral completed"
                );
                Ok(Outcome::new(
                    OutcomeKind::Completed,
                    format!("Referral completed; reward of {} locked in", quote.amount),
                    referral,
                ))
            }
            CompletionOutcome::AlreadyCompleted(referral) => {
                tracing::info!(
                    referral_id = %referral_id,
                    status = %referral.status,
                    "Referral completion ignored; already past pending"
                );
                Ok(Outcome::new(
                    OutcomeKind::AlreadyCompleted,
                    "Referral was already completed",
                    referral,
                ))
            }
        }
    }

    pub async fn get_referral(&self, referral_id: Uuid) -> Result<Referral, LedgerError> {
        self.repository.get_referral(referral_id).await
    }

    pub async fn list_referrals(&self, referrer_id: Uuid) -> Result<Vec<Referral>, LedgerError> {
        self.repository.list_referrals_by_referrer(referrer_id).await
    }
}
