use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Transition;
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Patient,
    Doctor,
    Admin,
}

impl FromStr for UserRole {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(UserRole::Patient),
            "doctor" => Ok(UserRole::Doctor),
            "admin" => Ok(UserRole::Admin),
            other => Err(LedgerError::Storage(format!("unknown user role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralType {
    PatientToPatient,
    DoctorToDoctor,
    DoctorToPatient,
}

impl ReferralType {
    /// Classifies a pair by the roles of its two parties. A doctor and a
    /// patient map to `DoctorToPatient` whichever side referred.
    pub fn from_roles(referrer: UserRole, referee: UserRole) -> Option<ReferralType> {
        match (referrer, referee) {
            (UserRole::Patient, UserRole::Patient) => Some(ReferralType::PatientToPatient),
            (UserRole::Doctor, UserRole::Doctor) => Some(ReferralType::DoctorToDoctor),
            (UserRole::Doctor, UserRole::Patient) | (UserRole::Patient, UserRole::Doctor) => {
                Some(ReferralType::DoctorToPatient)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralType::PatientToPatient => "patient_to_patient",
            ReferralType::DoctorToDoctor => "doctor_to_doctor",
            ReferralType::DoctorToPatient => "doctor_to_patient",
        }
    }
}

impl FromStr for ReferralType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient_to_patient" => Ok(ReferralType::PatientToPatient),
            "doctor_to_doctor" => Ok(ReferralType::DoctorToDoctor),
            "doctor_to_patient" => Ok(ReferralType::DoctorToPatient),
            other => Err(LedgerError::Storage(format!(
                "unknown referral type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Completed,
    Credited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralAction {
    Complete,
    Credit,
}

impl fmt::Display for ReferralAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferralAction::Complete => f.write_str("complete"),
            ReferralAction::Credit => f.write_str("credit"),
        }
    }
}

impl ReferralStatus {
    pub const ALL: [ReferralStatus; 3] = [
        ReferralStatus::Pending,
        ReferralStatus::Completed,
        ReferralStatus::Credited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Completed => "completed",
            ReferralStatus::Credited => "credited",
        }
    }

    /// The referral transition table.
    ///
    /// `Credit` is accepted from `Pending` as an administrative override that
    /// skips the qualifying-activity step.
    pub fn apply(self, action: ReferralAction) -> Result<Transition<ReferralStatus>, LedgerError> {
        use ReferralAction::*;
        use ReferralStatus::*;

        match (self, action) {
            (Pending, Complete) => Ok(Transition::Advance(Completed)),
            (Completed | Credited, Complete) => Ok(Transition::AlreadyApplied),
            (Pending | Completed, Credit) => Ok(Transition::Advance(Credited)),
            (Credited, Credit) => Ok(Transition::AlreadyApplied),
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferralStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::Storage(format!("unknown referral status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub referral_type: ReferralType,
    pub status: ReferralStatus,
    /// Locked in once, when the referral completes (or is credited directly).
    pub reward_amount: Option<BigDecimal>,
    pub settings_version: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub credited_at: Option<DateTime<Utc>>,
}

impl Referral {
    pub fn new(referrer_id: Uuid, referee_id: Uuid, referral_type: ReferralType) -> Self {
        Self {
            id: Uuid::new_v4(),
            referrer_id,
            referee_id,
            referral_type,
            status: ReferralStatus::Pending,
            reward_amount: None,
            settings_version: None,
            created_at: Utc::now(),
            completed_at: None,
            credited_at: None,
        }
    }

    /// Pending -> completed, fixing the reward. Leaves `self` untouched and
    /// returns `AlreadyApplied` when the referral is past pending.
    pub fn complete(
        &self,
        reward: &RewardQuote,
        at: DateTime<Utc>,
    ) -> Result<Transition<Referral>, LedgerError> {
        match self.status.apply(ReferralAction::Complete)? {
            Transition::AlreadyApplied => Ok(Transition::AlreadyApplied),
            Transition::Advance(status) => {
                let mut next = self.clone();
                next.status = status;
                next.reward_amount = Some(reward.amount.clone());
                next.settings_version = Some(reward.settings_version);
                next.completed_at = Some(at);
                Ok(Transition::Advance(next))
            }
        }
    }

    /// -> credited. A reward locked at completion always wins over `fallback`,
    /// which is only consulted for the pending override path.
    pub fn credit(
        &self,
        fallback: &RewardQuote,
        at: DateTime<Utc>,
    ) -> Result<Transition<Referral>, LedgerError> {
        match self.status.apply(ReferralAction::Credit)? {
            Transition::AlreadyApplied => Ok(Transition::AlreadyApplied),
            Transition::Advance(status) => {
                let mut next = self.clone();
                if next.reward_amount.is_none() {
                    next.reward_amount = Some(fallback.amount.clone());
                    next.settings_version = Some(fallback.settings_version);
                }
                if next.completed_at.is_none() {
                    next.completed_at = Some(at);
                }
                next.status = status;
                next.credited_at = Some(at);
                Ok(Transition::Advance(next))
            }
        }
    }

    /// The reward this referral pays. Present for every completed or credited referral.
    pub fn locked_reward(&self) -> Result<&BigDecimal, LedgerError> {
        self.reward_amount.as_ref().ok_or_else(|| {
            LedgerError::Storage(format!("referral {} has no locked reward", self.id))
        })
    }
}

/// Reward amount for one referral type, taken from a single settings version.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardQuote {
    pub amount: BigDecimal,
    pub settings_version: i64,
}
