//! Commission Allocator.
//!
//! Turns a resolved ancestor chain into the list of commissions owed for
//! one purchase. Each ancestor is priced from its own tier and its own
//! allocation configuration; the purchaser's settings never matter.

use rusqlite::Connection;
use upline_db::queries::{allocations, members};
use upline_db::DbError;
use upline_rates::schedule::RateSchedule;
use upline_types::{Address, Allocation, AllocationConfig, MemberTier};

use crate::walker::{self, HierarchySource};
use crate::Result;

/// What the allocator needs to know about an ancestor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorProfile {
    pub tier: MemberTier,
    pub config: Option<AllocationConfig>,
}

/// Result of looking up an ancestor's profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileLookup {
    Found(AncestorProfile),
    /// No member row.
    Missing,
    /// The stored tier or configuration cannot be decoded.
    Unreadable(String),
}

/// Read access to ancestor tiers and allocation configurations.
pub trait ProfileSource {
    fn profile(&self, member: &Address) -> Result<ProfileLookup>;
}

impl ProfileSource for Connection {
    fn profile(&self, member: &Address) -> Result<ProfileLookup> {
        let row = match members::get(self, member) {
            Ok(row) => row,
            Err(DbError::NotFound(_)) => return Ok(ProfileLookup::Missing),
            Err(e) => return Err(e.into()),
        };
        let Ok(tier) = row.tier.parse::<MemberTier>() else {
            return Ok(ProfileLookup::Unreadable(format!("tier {:?}", row.tier)));
        };
        let config = match allocations::get(self, member) {
            Ok(config) => config,
            Err(DbError::Corrupt(detail)) => return Ok(ProfileLookup::Unreadable(detail)),
            Err(e) => return Err(e.into()),
        };
        Ok(ProfileLookup::Found(AncestorProfile { tier, config }))
    }
}

/// Compute the allocations owed for a purchase of `amount` micro-units.
///
/// Ancestors whose rate or rounded amount is zero produce no allocation.
/// An ancestor whose profile cannot be read is skipped with a warning;
/// the rest of the chain is still paid.
pub fn allocate<S>(
    source: &S,
    schedule: &RateSchedule,
    purchaser: &Address,
    amount: u64,
    max_depth: u32,
) -> Result<Vec<Allocation>>
where
    S: HierarchySource + ProfileSource + ?Sized,
{
    let chain = walker::resolve_chain(source, purchaser, max_depth)?;
    let mut out = Vec::new();

    for ancestor in chain {
        let profile = match source.profile(&ancestor.address)? {
            ProfileLookup::Found(profile) => profile,
            ProfileLookup::Missing => {
                tracing::warn!(
                    %purchaser,
                    ancestor = %ancestor.address,
                    depth = ancestor.depth,
                    "ancestor vanished during settlement; skipping"
                );
                continue;
            }
            ProfileLookup::Unreadable(detail) => {
                tracing::warn!(
                    %purchaser,
                    ancestor = %ancestor.address,
                    depth = ancestor.depth,
                    %detail,
                    "unreadable ancestor profile; skipping"
                );
                continue;
            }
        };

        let rate = schedule.rate_for(profile.tier, profile.config.as_ref(), ancestor.depth);
        if rate.is_zero() {
            continue;
        }
        let commission = rate.apply(amount);
        if commission == 0 {
            continue;
        }
        out.push(Allocation {
            beneficiary: ancestor.address,
            depth: ancestor.depth,
            rate,
            amount: commission,
        });
    }

    Ok(out)
}
