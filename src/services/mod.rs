pub mod ledger;
pub mod referral;
pub mod reward;
pub mod settings;
pub mod withdrawal;

pub use ledger::{LedgerService, ReconciliationReport, WalletAudit};
pub use referral::ReferralEngine;
pub use reward::RewardCreditingService;
pub use settings::SettingsProvider;
pub use withdrawal::WithdrawalWorkflow;

use serde::Serialize;

use crate::ports::Posting;

/// Machine-readable result of a state transition. The `already_*` variants are
/// idempotency short-circuits: nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Created,
    Completed,
    AlreadyCompleted,
    Credited,
    AlreadyCredited,
    Requested,
    Approved,
    Processed,
    AlreadyProcessed,
    Rejected,
    AlreadyRejected,
}

/// Entity snapshot after a transition, with a display message and the ledger
/// posting it produced, if any.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub outcome: OutcomeKind,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting: Option<Posting>,
}

impl<T> Outcome<T> {
    pub fn new(outcome: OutcomeKind, message: impl Into<String>, data: T) -> Self {
        Self {
            outcome,
            message: message.into(),
            data,
            posting: None,
        }
    }

    pub fn with_posting(mut self, posting: Option<Posting>) -> Self {
        self.posting = posting;
        self
    }
}
