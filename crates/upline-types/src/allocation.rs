//! Custom allocation configuration and computed allocations.

use serde::{Deserialize, Serialize};

use crate::{Address, Rate};

/// How a partner splits its extra reward right.
///
/// Bonuses are paid on top of the fixed floor rates at the depths they
/// name. `self_rate` is retained by the partner and never distributed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Retained share.
    #[serde(default)]
    pub self_rate: Rate,
    /// Bonus at depth 1.
    #[serde(default)]
    pub level1_bonus: Rate,
    /// Bonus at depth 2.
    #[serde(default)]
    pub level2_bonus: Rate,
    /// Global partners only: bonus across the mid-tier depths (3..=10).
    #[serde(default)]
    pub partner_bonus: Rate,
}

impl AllocationConfig {
    /// Sum of every component, `None` on overflow.
    pub fn total(&self) -> Option<Rate> {
        self.self_rate
            .checked_add(self.level1_bonus)?
            .checked_add(self.level2_bonus)?
            .checked_add(self.partner_bonus)
    }
}

/// One intended commission for a purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub beneficiary: Address,
    /// Hops from the purchaser (direct referrer = 1).
    pub depth: u32,
    pub rate: Rate,
    /// Commission in micro-units.
    pub amount: u64,
}
