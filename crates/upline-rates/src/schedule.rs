//! Rate Schedule Resolver.
//!
//! Each ancestor earns according to its own tier, indexed by its depth
//! from the purchaser:
//!
//! ```text
//! tier            d1         d2         d3    d4    d5-10  d11-50  d51-100
//! normal          L1 floor   L2 floor   -     -     -      -       -
//! market_partner  L1 floor   L2 floor   1.5%  1%    0.5%   -       -
//!                 +level1    +level2
//! global_partner  1%         0.5%       0.3%  0.3%  0.3%   0.1%    0.05%
//!                 +level1    +level2    +partner bonus (d3-10)
//! ```
//!
//! The L1/L2 floors default to 3% and 2% and are configurable. Custom
//! bonuses apply only at the depths they name; every other depth uses the
//! fixed table.

use serde::{Deserialize, Serialize};
use upline_types::{AllocationConfig, MemberTier, Rate};

use crate::budget::{reward_budget, validate_config};
use crate::{RateError, Result};

/// Deepest level a `normal` member earns at.
pub const NORMAL_MAX_DEPTH: u32 = 2;

/// Deepest level a `market_partner` earns at.
pub const MARKET_PARTNER_MAX_DEPTH: u32 = 10;

/// Deepest level a `global_partner` earns at.
pub const GLOBAL_PARTNER_MAX_DEPTH: u32 = 100;

/// Default level-1 floor (3%).
pub const DEFAULT_LEVEL1_FLOOR: Rate = Rate::from_bps(300);

/// Default level-2 floor (2%).
pub const DEFAULT_LEVEL2_FLOOR: Rate = Rate::from_bps(200);

const MARKET_PARTNER_DEPTH3: Rate = Rate::from_bps(150);
const MARKET_PARTNER_DEPTH4: Rate = Rate::from_bps(100);
const MARKET_PARTNER_DEPTH5_10: Rate = Rate::from_bps(50);

const GLOBAL_PARTNER_DEPTH1: Rate = Rate::from_bps(100);
const GLOBAL_PARTNER_DEPTH2: Rate = Rate::from_bps(50);
const GLOBAL_PARTNER_DEPTH3_10: Rate = Rate::from_bps(30);
const GLOBAL_PARTNER_DEPTH11_50: Rate = Rate::from_bps(10);
const GLOBAL_PARTNER_DEPTH51_100: Rate = Rate::from_bps(5);

/// Configurable floor rates shared by `normal` and `market_partner`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// Depth-1 floor in basis points.
    #[serde(rename = "level1_floor_bps", default = "default_level1_floor")]
    pub level1_floor: Rate,
    /// Depth-2 floor in basis points.
    #[serde(rename = "level2_floor_bps", default = "default_level2_floor")]
    pub level2_floor: Rate,
}

fn default_level1_floor() -> Rate {
    DEFAULT_LEVEL1_FLOOR
}

fn default_level2_floor() -> Rate {
    DEFAULT_LEVEL2_FLOOR
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            level1_floor: DEFAULT_LEVEL1_FLOOR,
            level2_floor: DEFAULT_LEVEL2_FLOOR,
        }
    }
}

/// The resolver. Cheap to clone; holds only the configured floors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateSchedule {
    level1_floor: Rate,
    level2_floor: Rate,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            level1_floor: DEFAULT_LEVEL1_FLOOR,
            level2_floor: DEFAULT_LEVEL2_FLOOR,
        }
    }
}

impl RateSchedule {
    /// Build a schedule from configured floors.
    ///
    /// # Errors
    ///
    /// - [`RateError::InvalidFloor`] if a floor exceeds 100%, or if the
    ///   floors plus the largest budget could pay out more than 100% to a
    ///   single ancestor
    pub fn new(config: &CommissionConfig) -> Result<Self> {
        for (name, floor) in [
            ("level1_floor_bps", config.level1_floor),
            ("level2_floor_bps", config.level2_floor),
        ] {
            let ceiling = floor.checked_add(reward_budget(MemberTier::MarketPartner));
            if ceiling.map_or(true, |c| c > Rate::ONE) {
                return Err(RateError::InvalidFloor(format!(
                    "{name} = {} leaves no room for the partner budget",
                    floor.bps()
                )));
            }
        }
        Ok(Self {
            level1_floor: config.level1_floor,
            level2_floor: config.level2_floor,
        })
    }

    /// Commission rate for an ancestor of `tier` sitting `depth` hops above
    /// the purchaser.
    ///
    /// A stored configuration that no longer validates for `tier` is ignored
    /// and only the fixed table applies.
    pub fn rate_for(
        &self,
        tier: MemberTier,
        config: Option<&AllocationConfig>,
        depth: u32,
    ) -> Rate {
        if depth == 0 || depth > earning_depth_cap(tier) {
            return Rate::ZERO;
        }

        let floor = self.floor_rate(tier, depth);
        let bonus = match config {
            Some(config) => match validate_config(tier, config) {
                Ok(()) => bonus_rate(tier, config, depth),
                Err(e) => {
                    tracing::warn!(%tier, depth, error = %e, "ignoring invalid allocation config");
                    Rate::ZERO
                }
            },
            None => Rate::ZERO,
        };
        floor.checked_add(bonus).unwrap_or(floor)
    }

    /// Fixed-table rate, ignoring any custom configuration.
    pub fn floor_rate(&self, tier: MemberTier, depth: u32) -> Rate {
        match tier {
            MemberTier::Normal => match depth {
                1 => self.level1_floor,
                2 => self.level2_floor,
                _ => Rate::ZERO,
            },
            MemberTier::MarketPartner => match depth {
                1 => self.level1_floor,
                2 => self.level2_floor,
                3 => MARKET_PARTNER_DEPTH3,
                4 => MARKET_PARTNER_DEPTH4,
                5..=MARKET_PARTNER_MAX_DEPTH => MARKET_PARTNER_DEPTH5_10,
                _ => Rate::ZERO,
            },
            MemberTier::GlobalPartner => match depth {
                1 => GLOBAL_PARTNER_DEPTH1,
                2 => GLOBAL_PARTNER_DEPTH2,
                3..=10 => GLOBAL_PARTNER_DEPTH3_10,
                11..=50 => GLOBAL_PARTNER_DEPTH11_50,
                51..=GLOBAL_PARTNER_MAX_DEPTH => GLOBAL_PARTNER_DEPTH51_100,
                _ => Rate::ZERO,
            },
        }
    }

    /// Highest rate any configuration could produce at this position:
    /// the floor plus the tier's whole budget.
    pub fn ceiling(&self, tier: MemberTier, depth: u32) -> Rate {
        let floor = self.floor_rate(tier, depth);
        if floor.is_zero() {
            return Rate::ZERO;
        }
        floor.checked_add(reward_budget(tier)).unwrap_or(floor)
    }
}

/// Deepest level at which `tier` earns anything.
pub fn earning_depth_cap(tier: MemberTier) -> u32 {
    match tier {
        MemberTier::Normal => NORMAL_MAX_DEPTH,
        MemberTier::MarketPartner => MARKET_PARTNER_MAX_DEPTH,
        MemberTier::GlobalPartner => GLOBAL_PARTNER_MAX_DEPTH,
    }
}

fn bonus_rate(tier: MemberTier, config: &AllocationConfig, depth: u32) -> Rate {
    match (tier, depth) {
        (MemberTier::Normal, _) => Rate::ZERO,
        (MemberTier::MarketPartner | MemberTier::GlobalPartner, 1) => config.level1_bonus,
        (MemberTier::MarketPartner | MemberTier::GlobalPartner, 2) => config.level2_bonus,
        (MemberTier::GlobalPartner, 3..=10) => config.partner_bonus,
        (MemberTier::MarketPartner | MemberTier::GlobalPartner, _) => Rate::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [MemberTier; 3] = [
        MemberTier::Normal,
        MemberTier::MarketPartner,
        MemberTier::GlobalPartner,
    ];

    fn bps(tier: MemberTier, depth: u32) -> u32 {
        RateSchedule::default().rate_for(tier, None, depth).bps()
    }

    #[test]
    fn test_normal_table() {
        assert_eq!(bps(MemberTier::Normal, 1), 300);
        assert_eq!(bps(MemberTier::Normal, 2), 200);
        assert_eq!(bps(MemberTier::Normal, 3), 0);
    }

    #[test]
    fn test_market_partner_table() {
        let expected = [(1, 300), (2, 200), (3, 150), (4, 100), (5, 50), (10, 50), (11, 0)];
        for (depth, rate) in expected {
            assert_eq!(bps(MemberTier::MarketPartner, depth), rate, "depth {depth}");
        }
    }

    #[test]
    fn test_global_partner_table() {
        let expected = [
            (1, 100),
            (2, 50),
            (3, 30),
            (4, 30),
            (10, 30),
            (11, 10),
            (50, 10),
            (51, 5),
            (100, 5),
            (101, 0),
        ];
        for (depth, rate) in expected {
            assert_eq!(bps(MemberTier::GlobalPartner, depth), rate, "depth {depth}");
        }
    }

    #[test]
    fn test_depth_zero_earns_nothing() {
        for tier in TIERS {
            assert_eq!(bps(tier, 0), 0);
        }
    }

    #[test]
    fn test_depth_caps() {
        for tier in TIERS {
            let cap = earning_depth_cap(tier);
            assert!(bps(tier, cap) > 0, "{tier} earns at its cap");
            for depth in cap + 1..=cap + 20 {
                assert_eq!(bps(tier, depth), 0, "{tier} past cap at {depth}");
            }
        }
    }

    #[test]
    fn test_market_partner_custom_levels() {
        let schedule = RateSchedule::default();
        let config = AllocationConfig {
            level1_bonus: Rate::from_bps(1_000),
            ..AllocationConfig::default()
        };
        let tier = MemberTier::MarketPartner;
        assert_eq!(schedule.rate_for(tier, Some(&config), 1).bps(), 1_300);
        assert_eq!(schedule.rate_for(tier, Some(&config), 2).bps(), 200);
        assert_eq!(schedule.rate_for(tier, Some(&config), 3).bps(), 150);

        let config = AllocationConfig {
            level2_bonus: Rate::from_bps(1_000),
            ..AllocationConfig::default()
        };
        assert_eq!(schedule.rate_for(tier, Some(&config), 2).bps(), 1_200);
    }

    #[test]
    fn test_global_partner_partner_bonus_is_mid_tier_only() {
        let schedule = RateSchedule::default();
        let config = AllocationConfig {
            partner_bonus: Rate::from_bps(200),
            ..AllocationConfig::default()
        };
        let tier = MemberTier::GlobalPartner;
        assert_eq!(schedule.rate_for(tier, Some(&config), 2).bps(), 50);
        assert_eq!(schedule.rate_for(tier, Some(&config), 3).bps(), 230);
        assert_eq!(schedule.rate_for(tier, Some(&config), 10).bps(), 230);
        assert_eq!(schedule.rate_for(tier, Some(&config), 11).bps(), 10);
    }

    #[test]
    fn test_self_rate_is_never_paid() {
        let schedule = RateSchedule::default();
        let config = AllocationConfig {
            self_rate: Rate::from_bps(500),
            ..AllocationConfig::default()
        };
        for depth in 0..=GLOBAL_PARTNER_MAX_DEPTH + 1 {
            assert_eq!(
                schedule.rate_for(MemberTier::GlobalPartner, Some(&config), depth),
                schedule.floor_rate(MemberTier::GlobalPartner, depth)
            );
        }
    }

    #[test]
    fn test_invalid_config_falls_back_to_floor() {
        let schedule = RateSchedule::default();
        let over_budget = AllocationConfig {
            level1_bonus: Rate::from_bps(900),
            ..AllocationConfig::default()
        };
        // Valid for a market partner, over budget once demoted to global partner.
        assert_eq!(
            schedule
                .rate_for(MemberTier::GlobalPartner, Some(&over_budget), 1)
                .bps(),
            100
        );
        // Normal members never receive bonuses.
        assert_eq!(
            schedule.rate_for(MemberTier::Normal, Some(&over_budget), 1).bps(),
            300
        );
    }

    #[test]
    fn test_rate_never_exceeds_ceiling() {
        let schedule = RateSchedule::default();
        let configs = [
            AllocationConfig::default(),
            AllocationConfig {
                level1_bonus: Rate::from_bps(500),
                ..AllocationConfig::default()
            },
            AllocationConfig {
                level2_bonus: Rate::from_bps(500),
                ..AllocationConfig::default()
            },
            AllocationConfig {
                partner_bonus: Rate::from_bps(500),
                ..AllocationConfig::default()
            },
            AllocationConfig {
                self_rate: Rate::from_bps(100),
                level1_bonus: Rate::from_bps(200),
                level2_bonus: Rate::from_bps(100),
                partner_bonus: Rate::from_bps(100),
            },
        ];
        for tier in TIERS {
            for config in &configs {
                for depth in 0..=GLOBAL_PARTNER_MAX_DEPTH + 1 {
                    let rate = schedule.rate_for(tier, Some(config), depth);
                    assert!(rate <= schedule.ceiling(tier, depth), "{tier} d{depth}");
                    assert!(rate >= schedule.floor_rate(tier, depth));
                }
            }
        }
    }

    #[test]
    fn test_configured_floors() {
        let schedule = RateSchedule::new(&CommissionConfig {
            level1_floor: Rate::from_bps(400),
            level2_floor: Rate::from_bps(100),
        })
        .expect("valid floors");
        assert_eq!(schedule.rate_for(MemberTier::Normal, None, 1).bps(), 400);
        assert_eq!(schedule.rate_for(MemberTier::MarketPartner, None, 2).bps(), 100);
        // Global partner table is fixed.
        assert_eq!(schedule.rate_for(MemberTier::GlobalPartner, None, 1).bps(), 100);
    }

    #[test]
    fn test_floor_out_of_range() {
        let config = CommissionConfig {
            level1_floor: Rate::from_bps(9_500),
            ..CommissionConfig::default()
        };
        assert!(matches!(
            RateSchedule::new(&config),
            Err(RateError::InvalidFloor(_))
        ));
    }

    #[test]
    fn test_config_from_toml() {
        let config: CommissionConfig = toml::from_str("level1_floor_bps = 250").expect("parse");
        assert_eq!(config.level1_floor.bps(), 250);
        assert_eq!(config.level2_floor, DEFAULT_LEVEL2_FLOOR);
    }
}
