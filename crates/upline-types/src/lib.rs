//! # upline-types
//!
//! Shared domain types used across the Upline workspace: member addresses,
//! tiers, fixed-point amounts, rational commission rates and the records
//! produced by a settlement.

pub mod address;
pub mod allocation;
pub mod amount;
pub mod member;
pub mod purchase;
pub mod rate;

pub use address::Address;
pub use allocation::{Allocation, AllocationConfig};
pub use member::MemberTier;
pub use purchase::{CommissionRecord, PurchaseCategory, PurchaseEvent, PurchaseTxId};
pub use rate::Rate;

/// Micro-units per unit (1 unit = 1,000,000 micro-units).
pub const MICRO_UNITS_PER_UNIT: u64 = 1_000_000;

/// Global safety bound on upline traversal, independent of tier.
pub const MAX_CHAIN_DEPTH: u32 = 100;

/// Validation errors for domain values entering the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// Address is empty, too long or contains non-alphanumeric characters.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Purchase transaction identifier is malformed.
    #[error("invalid purchase transaction id: {0:?}")]
    InvalidTxId(String),

    /// Decimal amount could not be parsed into micro-units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown member tier name.
    #[error("unknown member tier: {0:?}")]
    UnknownTier(String),

    /// Unknown purchase category name.
    #[error("unknown purchase category: {0:?}")]
    UnknownCategory(String),
}

/// Convenience result type for domain value parsing.
pub type Result<T> = std::result::Result<T, TypesError>;
