//! # upline-engine
//!
//! Hierarchical commission distribution. For every verified purchase the
//! engine walks the purchaser's upline, prices each ancestor's commission
//! from its own tier and allocation, and credits balances while appending
//! one immutable ledger record per beneficiary, exactly once per purchase.
//!
//! ## Modules
//!
//! - [`walker`]: bounded upward traversal
//! - [`allocator`]: chain + schedule -> allocations
//! - [`ledger`]: idempotent, atomic application
//! - [`engine`]: Operation entry points (settle, referrer, allocation, tier)

pub mod allocator;
pub mod engine;
pub mod ledger;
pub mod walker;

pub use engine::{CommissionEngine, MemberSummary, Settlement};
pub use ledger::ApplyOutcome;

use upline_db::DbError;
use upline_rates::RateError;
use upline_types::{Address, TypesError};

/// Error types for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The member is not registered.
    #[error("unknown member {0}")]
    UnknownMember(Address),

    /// Purchase amount is zero.
    #[error("purchase amount must be positive")]
    ZeroAmount,

    /// Purchase amount does not fit the ledger's integer range.
    #[error("purchase amount {0} exceeds the storable range")]
    AmountTooLarge(u64),

    /// A malformed address, transaction id or amount.
    #[error(transparent)]
    InvalidInput(#[from] TypesError),

    /// Registering an address twice.
    #[error("member {0} is already registered")]
    AlreadyRegistered(Address),

    /// The member's referrer is immutable once set.
    #[error("member {member} already has referrer {existing}")]
    ReferrerAlreadySet {
        /// The member.
        member: Address,
        /// The referrer already on record.
        existing: String,
    },

    /// `referrer == member`.
    #[error("member cannot refer itself")]
    SelfReferral,

    /// The member already sits in the referrer's upline.
    #[error("assigning {referrer} as referrer of {member} would create a cycle")]
    ReferralCycle {
        /// The member.
        member: Address,
        /// The rejected referrer.
        referrer: Address,
    },

    /// Allocation configuration rejected.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// Same transaction id re-delivered with different purchase details.
    #[error("purchase {tx_id} was already settled with different details")]
    ConflictingPurchase {
        /// The re-used transaction id.
        tx_id: String,
    },

    /// Crediting the member would push its balance past the storable range.
    #[error("balance of {0} would exceed the storable range")]
    BalanceOverflow(Address),

    /// The relational store failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl EngineError {
    /// Whether the caller should retry the same request later.
    ///
    /// Every engine operation is idempotent, so retrying after any
    /// infrastructure failure is safe.
    pub fn is_retriable(&self) -> bool {
        match self {
            EngineError::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, EngineError::Store(_) | EngineError::BalanceOverflow(_))
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Store(DbError::Sqlite(e))
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let busy = EngineError::from(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_retriable());
        assert!(!busy.is_input_error());

        assert!(!EngineError::SelfReferral.is_retriable());
        assert!(EngineError::ZeroAmount.is_input_error());

        let full = EngineError::BalanceOverflow(Address::parse("a").expect("address"));
        assert!(!full.is_retriable());
        assert!(!full.is_input_error());
    }
}
