//! Member tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Commission-eligibility class of a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberTier {
    Normal,
    MarketPartner,
    GlobalPartner,
}

impl MemberTier {
    /// Stored / wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            MemberTier::Normal => "normal",
            MemberTier::MarketPartner => "market_partner",
            MemberTier::GlobalPartner => "global_partner",
        }
    }

    /// Whether the tier holds an extra reward right and may carry a custom
    /// allocation configuration.
    pub fn is_partner(self) -> bool {
        match self {
            MemberTier::Normal => false,
            MemberTier::MarketPartner | MemberTier::GlobalPartner => true,
        }
    }
}

impl fmt::Display for MemberTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberTier {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(MemberTier::Normal),
            "market_partner" => Ok(MemberTier::MarketPartner),
            "global_partner" => Ok(MemberTier::GlobalPartner),
            other => Err(TypesError::UnknownTier(other.to_string())),
        }
    }
}
