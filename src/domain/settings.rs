use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::referral::{ReferralType, RewardQuote};
use crate::error::LedgerError;
use crate::validation::{validate_amount, AMOUNT_SCALE};

/// Mutable program configuration. Each version is immutable once published;
/// consumers copy the values they need onto their own entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralSettings {
    pub patient_to_patient_reward: BigDecimal,
    pub doctor_to_doctor_reward: BigDecimal,
    pub doctor_to_patient_reward: BigDecimal,
    pub min_withdrawal: BigDecimal,
    pub is_enabled: bool,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Default for ReferralSettings {
    fn default() -> Self {
        Self {
            patient_to_patient_reward: BigDecimal::from(50),
            doctor_to_doctor_reward: BigDecimal::from(200),
            doctor_to_patient_reward: BigDecimal::from(100),
            min_withdrawal: BigDecimal::from(100),
            is_enabled: true,
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

impl ReferralSettings {
    pub fn reward_for(&self, referral_type: ReferralType) -> RewardQuote {
        let amount = match referral_type {
            ReferralType::PatientToPatient => &self.patient_to_patient_reward,
            ReferralType::DoctorToDoctor => &self.doctor_to_doctor_reward,
            ReferralType::DoctorToPatient => &self.doctor_to_patient_reward,
        };
        RewardQuote {
            amount: amount.clone(),
            settings_version: self.version,
        }
    }

    /// Rewards follow the same amount rules as every other posting.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_amount("patient_to_patient_reward", &self.patient_to_patient_reward)?;
        validate_amount("doctor_to_doctor_reward", &self.doctor_to_doctor_reward)?;
        validate_amount("doctor_to_patient_reward", &self.doctor_to_patient_reward)?;

        if self.min_withdrawal < BigDecimal::zero() {
            return Err(LedgerError::Validation(
                "min_withdrawal: must not be negative".to_string(),
            ));
        }
        if self.min_withdrawal.with_scale(AMOUNT_SCALE) != self.min_withdrawal {
            return Err(LedgerError::Validation(format!(
                "min_withdrawal: must have at most {} decimal places",
                AMOUNT_SCALE
            )));
        }
        Ok(())
    }
}

/// Partial update of the settings; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub patient_to_patient_reward: Option<BigDecimal>,
    pub doctor_to_doctor_reward: Option<BigDecimal>,
    pub doctor_to_patient_reward: Option<BigDecimal>,
    pub min_withdrawal: Option<BigDecimal>,
    pub is_enabled: Option<bool>,
}

impl SettingsUpdate {
    /// Produces the next settings version. The result is validated before it
    /// is returned.
    pub fn apply_to(
        self,
        current: &ReferralSettings,
        at: DateTime<Utc>,
    ) -> Result<ReferralSettings, LedgerError> {
        let next = ReferralSettings {
            patient_to_patient_reward: self
                .patient_to_patient_reward
                .unwrap_or_else(|| current.patient_to_patient_reward.clone()),
            doctor_to_doctor_reward: self
                .doctor_to_doctor_reward
                .unwrap_or_else(|| current.doctor_to_doctor_reward.clone()),
            doctor_to_patient_reward: self
                .doctor_to_patient_reward
                .unwrap_or_else(|| current.doctor_to_patient_reward.clone()),
            min_withdrawal: self
                .min_withdrawal
                .unwrap_or_else(|| current.min_withdrawal.clone()),
            is_enabled: self.is_enabled.unwrap_or(current.is_enabled),
            version: current.version + 1,
            updated_at: at,
        };
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ReferralSettings::default().validate().is_ok());
    }

    #[test]
    fn test_reward_for_carries_version() {
        let settings = ReferralSettings {
            version: 7,
            ..ReferralSettings::default()
        };
        let quote = settings.reward_for(ReferralType::DoctorToDoctor);
        assert_eq!(quote.amount, BigDecimal::from(200));
        assert_eq!(quote.settings_version, 7);
    }

    #[test]
    fn test_update_bumps_version_and_keeps_unset_fields() {
        let current = ReferralSettings::default();
        let next = SettingsUpdate {
            min_withdrawal: Some(BigDecimal::from(250)),
            ..SettingsUpdate::default()
        }
        .apply_to(&current, Utc::now())
        .unwrap();
        assert_eq!(next.version, current.version + 1);
        assert_eq!(next.min_withdrawal, BigDecimal::from(250));
        assert_eq!(next.patient_to_patient_reward, current.patient_to_patient_reward);
    }

    #[test]
    fn test_update_rejects_zero_reward() {
        let err = SettingsUpdate {
            doctor_to_patient_reward: Some(BigDecimal::zero()),
            ..SettingsUpdate::default()
        }
        .apply_to(&ReferralSettings::default(), Utc::now())
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_update_rejects_amounts_finer_than_cents() {
        let reward = SettingsUpdate {
            patient_to_patient_reward: Some("10.555".parse().unwrap()),
            ..SettingsUpdate::default()
        }
        .apply_to(&ReferralSettings::default(), Utc::now())
        .unwrap_err();
        assert!(matches!(reward, LedgerError::Validation(msg) if msg.contains("decimal places")));

        let rounds_to_zero = SettingsUpdate {
            doctor_to_doctor_reward: Some("0.004".parse().unwrap()),
            ..SettingsUpdate::default()
        }
        .apply_to(&ReferralSettings::default(), Utc::now());
        assert!(matches!(rounds_to_zero, Err(LedgerError::Validation(_))));

        let minimum = SettingsUpdate {
            min_withdrawal: Some("99.999".parse().unwrap()),
            ..SettingsUpdate::default()
        }
        .apply_to(&ReferralSettings::default(), Utc::now());
        assert!(matches!(minimum, Err(LedgerError::Validation(_))));

        let cents = SettingsUpdate {
            patient_to_patient_reward: Some("10.55".parse().unwrap()),
            min_withdrawal: Some("0".parse().unwrap()),
            ..SettingsUpdate::default()
        }
        .apply_to(&ReferralSettings::default(), Utc::now())
        .unwrap();
        assert_eq!(cents.patient_to_patient_reward, "10.55".parse::<BigDecimal>().unwrap());
    }
}
