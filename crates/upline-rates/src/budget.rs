//! Extra-reward-right budgets.
//!
//! Partners may split a fixed budget between self-retention and bonuses
//! paid on top of the floor rates:
//!
//! - **Market partner**: 10% (1000 bps) across self, level-1 and level-2
//! - **Global partner**: 5% (500 bps) across self, level-1, level-2 and the
//!   mid-tier partner bonus
//!
//! The budget is enforced when a configuration is written; the resolver
//! re-checks it on read so a stale row can never pay past the bound.

use upline_types::{AllocationConfig, MemberTier, Rate};

use crate::{RateError, Result};

/// Market partner extra reward right (10%).
pub const MARKET_PARTNER_BUDGET: Rate = Rate::from_bps(1_000);

/// Global partner extra reward right (5%).
pub const GLOBAL_PARTNER_BUDGET: Rate = Rate::from_bps(500);

/// The tier's extra-reward-right budget; zero for `normal`.
pub fn reward_budget(tier: MemberTier) -> Rate {
    match tier {
        MemberTier::Normal => Rate::ZERO,
        MemberTier::MarketPartner => MARKET_PARTNER_BUDGET,
        MemberTier::GlobalPartner => GLOBAL_PARTNER_BUDGET,
    }
}

/// Validate a custom allocation for a member of `tier`.
///
/// # Errors
///
/// - [`RateError::NotEligible`] for `normal` members
/// - [`RateError::PartnerBonusNotAllowed`] if a market partner sets a partner bonus
/// - [`RateError::BudgetExceeded`] if the components sum past the budget
pub fn validate_config(tier: MemberTier, config: &AllocationConfig) -> Result<()> {
    match tier {
        MemberTier::Normal => return Err(RateError::NotEligible { tier }),
        MemberTier::MarketPartner if !config.partner_bonus.is_zero() => {
            return Err(RateError::PartnerBonusNotAllowed)
        }
        MemberTier::MarketPartner | MemberTier::GlobalPartner => {}
    }

    let budget = reward_budget(tier);
    // u32 overflow can only happen far beyond any budget
    let total = config.total().unwrap_or(Rate::from_bps(u32::MAX));
    if total > budget {
        return Err(RateError::BudgetExceeded {
            tier,
            total,
            budget,
        });
    }
    Ok(())
}
