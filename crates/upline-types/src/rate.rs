//! Commission rates as rational fractions of [`Rate::DENOMINATOR`].
//!
//! Every rate in the tier tables is a whole number of basis points, so a
//! fixed denominator keeps totals exact and reproducible.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A commission rate, `bps / 10_000`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    /// Denominator of every rate (basis points).
    pub const DENOMINATOR: u32 = 10_000;

    /// 0%.
    pub const ZERO: Rate = Rate(0);

    /// 100%.
    pub const ONE: Rate = Rate(Self::DENOMINATOR);

    /// Construct from basis points.
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Basis points.
    pub const fn bps(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Sum of two rates, `None` on overflow.
    pub fn checked_add(self, other: Rate) -> Option<Rate> {
        self.0.checked_add(other.0).map(Rate)
    }

    /// Apply the rate to a micro-unit amount, rounding down.
    pub fn apply(self, amount: u64) -> u64 {
        let product = u128::from(amount) * u128::from(self.0) / u128::from(Self::DENOMINATOR);
        // rate <= 1 in every caller; saturate rather than wrap otherwise
        u64::try_from(product).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
