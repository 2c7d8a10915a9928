//! Framework-agnostic ledger entities and the rules that govern them.

pub mod referral;
pub mod settings;
pub mod transaction;
pub mod wallet;
pub mod withdrawal;

pub use referral::{Referral, ReferralAction, ReferralStatus, ReferralType, RewardQuote, UserRole};
pub use settings::{ReferralSettings, SettingsUpdate};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
pub use wallet::Wallet;
pub use withdrawal::{PaymentMethod, WithdrawalAction, WithdrawalRequest, WithdrawalStatus};

/// Result of validating a requested state change against an entity's
/// transition table.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<S> {
    /// The change is legal and leads to this new state.
    Advance(S),
    /// The entity already reached the requested state; nothing to write.
    AlreadyApplied,
}
