//! # upline-rates
//!
//! Commission rate schedules (the built-in tier table plus each partner's
//! custom allocation) and validation of the extra-reward-right budget.
//!
//! ## Modules
//!
//! - [`budget`]: Extra-reward-right budgets and allocation validation
//! - [`schedule`]: resolver `(tier, config, depth) -> rate`

pub mod budget;
pub mod schedule;

use upline_types::{MemberTier, Rate};

/// Error types for rate configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    /// The tier holds no extra reward right.
    #[error("tier {tier} cannot carry a custom allocation")]
    NotEligible {
        /// The member's tier.
        tier: MemberTier,
    },

    /// Allocation components sum past the tier's budget.
    #[error("allocation total {total} exceeds the {tier} budget of {budget}")]
    BudgetExceeded {
        /// The member's tier.
        tier: MemberTier,
        /// Sum of the requested components.
        total: Rate,
        /// The tier's extra-reward-right budget.
        budget: Rate,
    },

    /// Mid-tier partner bonus requested by a tier that has none.
    #[error("partner bonus is only available to global partners")]
    PartnerBonusNotAllowed,

    /// A configured floor rate is out of range.
    #[error("invalid floor rate: {0}")]
    InvalidFloor(String),
}

/// Convenience result type for rate operations.
pub type Result<T> = std::result::Result<T, RateError>;
